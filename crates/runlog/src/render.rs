//! Text rendering shared by the console and text-file sinks.

use chrono::Local;
use runlog_contracts::ScalarValue;

/// Format one text line: optional local timestamp, dispatcher prefix, message.
pub(crate) fn text_line(with_timestamp: bool, prefix: &str, message: &str) -> String {
    if with_timestamp {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        format!("{timestamp} | {prefix}{message}")
    } else {
        format!("{prefix}{message}")
    }
}

/// Render a batch as a two-column table sorted by key, with a dash rule
/// above and below. Keys left-aligned, values right-aligned.
pub(crate) fn render_table<'a>(
    entries: impl Iterator<Item = (&'a str, &'a ScalarValue)>,
) -> String {
    let mut rows: Vec<(&str, String)> = entries.map(|(k, v)| (k, v.to_string())).collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    let key_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    let rule = format!("{}  {}", "-".repeat(key_width), "-".repeat(value_width));

    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    for (key, value) in &rows {
        out.push_str(&format!("{key:<key_width$}  {value:>value_width$}\n"));
    }
    out.push_str(&rule);
    out
}
