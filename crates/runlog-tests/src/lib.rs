//! # Integration tests
//!
//! End-to-end tests driving the dispatcher through full training-loop
//! shapes against temp directories.

#[cfg(test)]
mod e2e_tests {
    use std::fs;

    use runlog::{
        create_dispatcher, ConsoleSink, CsvSink, Dispatcher, SinkConfig, SinkKind, TextFileSink,
        VizSink,
    };
    use tempfile::tempdir;

    /// End-to-end: console + CSV + text + viz fed by one loop with a
    /// growing key set, dumped every iteration.
    #[test]
    fn test_e2e_training_loop() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("progress.csv");
        let txt_path = dir.path().join("progress.txt");
        let viz_dir = dir.path().join("viz");

        let mut logger = Dispatcher::new();
        logger
            .add_sink(Box::new(ConsoleSink::new().with_timestamp(false)))
            .unwrap();
        logger.add_sink(Box::new(CsvSink::new(&csv_path).unwrap())).unwrap();
        logger
            .add_sink(Box::new(
                TextFileSink::new(&txt_path).unwrap().with_timestamp(false),
            ))
            .unwrap();
        logger.add_sink(Box::new(VizSink::jsonl(&viz_dir).unwrap())).unwrap();
        logger.disable_warnings();

        logger.log("Starting up...").unwrap();
        for i in 0..4i64 {
            logger.with_prefix(format!("itr {i}: "), |logger| {
                logger.log("Running training step")?;
                logger.record("itr", i)?;
                logger.record("loss", 100.0 / (2 + i) as f64)?;
                if i > 0 {
                    logger.record("x", i)?;
                }
                if i > 1 {
                    logger.record("y", i + 1)?;
                }
                logger.dump_all(None)
            })
            .unwrap();
        }
        logger.remove_all();

        // CSV: expanded header, earlier rows padded with empty cells.
        assert_eq!(
            fs::read_to_string(&csv_path).unwrap(),
            "itr,loss,x,y\n\
             0,50,,\n\
             1,33.333333333333336,1,\n\
             2,25,2,3\n\
             3,20,3,4\n"
        );

        // Text file: prefixed lines plus one table per dump.
        let txt = fs::read_to_string(&txt_path).unwrap();
        assert!(txt.starts_with("Starting up...\nitr 0: Running training step\n"));
        assert!(txt.contains("----  --\nitr    0\nloss  50\n----  --\n"));

        // Viz: one scalar event per key per dump, stepped by dump index.
        let events = fs::read_to_string(viz_dir.join("events.jsonl")).unwrap();
        let events: Vec<serde_json::Value> = events
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 2 + 3 + 4 + 4);
        assert_eq!(events[0]["name"], "itr");
        assert_eq!(events[0]["step"], 0.0);
        let last = events.last().unwrap();
        assert_eq!(last["name"], "y");
        assert_eq!(last["step"], 3.0);
        assert_eq!(last["value"], 4.0);
    }

    /// The whole pipeline can come up from declarative config alone.
    #[test]
    fn test_e2e_config_driven_pipeline() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("metrics/progress.csv");

        let raw = format!(
            r#"[
                {{"kind": "console", "params": {{"timestamp": "false"}}}},
                {{"kind": "csv", "params": {{"path": "{}", "keys": "^train/"}}}}
            ]"#,
            csv_path.display()
        );
        let configs: Vec<SinkConfig> = serde_json::from_str(&raw).unwrap();
        let mut logger = create_dispatcher(configs).unwrap();

        logger.record("train/loss", 0.5).unwrap();
        logger.record("eval/loss", 0.7).unwrap();
        logger.dump_all(None).unwrap();
        logger.remove_all();

        // Key filter kept eval metrics out of the CSV.
        assert_eq!(
            fs::read_to_string(&csv_path).unwrap(),
            "train/loss\n0.5\n"
        );
    }

    /// Round-trip: what a standard delimited-row reader parses back equals
    /// what was recorded, with missing keys as empty strings.
    #[test]
    fn test_e2e_csv_round_trip() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");

        let mut logger = Dispatcher::new();
        logger.add_sink(Box::new(CsvSink::new(&csv_path).unwrap())).unwrap();

        logger.record("note", "first, with comma").unwrap();
        logger.record("itr", 0).unwrap();
        logger.dump_all(None).unwrap();
        logger.record("note", "second").unwrap();
        logger.record("itr", 1).unwrap();
        logger.record("extra", true).unwrap();
        logger.dump_all(None).unwrap();
        logger.remove_all();

        let contents = fs::read_to_string(&csv_path).unwrap();
        let rows = parse_csv(&contents);
        assert_eq!(rows[0], ["note", "itr", "extra"]);
        assert_eq!(rows[1], ["first, with comma", "0", ""]);
        assert_eq!(rows[2], ["second", "1", "true"]);
    }

    /// Re-adding a sink kind replaces it, giving callers a fresh output.
    #[test]
    fn test_e2e_readding_csv_resets_output() {
        let dir = tempdir().unwrap();
        let first_path = dir.path().join("first.csv");
        let second_path = dir.path().join("second.csv");

        let mut logger = Dispatcher::new();
        logger.add_sink(Box::new(CsvSink::new(&first_path).unwrap())).unwrap();
        logger.record("a", 1).unwrap();
        logger.dump_all(None).unwrap();

        logger.add_sink(Box::new(CsvSink::new(&second_path).unwrap())).unwrap();
        assert!(logger.has_kind(SinkKind::Csv));
        logger.record("b", 2).unwrap();
        logger.dump_all(None).unwrap();
        logger.remove_all();

        assert_eq!(fs::read_to_string(&first_path).unwrap(), "a\n1\n");
        assert_eq!(fs::read_to_string(&second_path).unwrap(), "b\n2\n");
    }

    /// Minimal RFC-4180 reader for round-trip verification.
    fn parse_csv(input: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row: Vec<String> = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();
        while let Some(c) = chars.next() {
            if in_quotes {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => in_quotes = false,
                    _ => field.push(c),
                }
            } else {
                match c {
                    '"' => in_quotes = true,
                    ',' => row.push(std::mem::take(&mut field)),
                    '\n' => {
                        row.push(std::mem::take(&mut field));
                        rows.push(std::mem::take(&mut row));
                    }
                    '\r' => {}
                    _ => field.push(c),
                }
            }
        }
        if !field.is_empty() || !row.is_empty() {
            row.push(field);
            rows.push(row);
        }
        rows
    }
}
