//! Dispatcher - fan-out of records to registered sinks.

use regex::Regex;
use tracing::debug;

use runlog_contracts::{
    LogWarning, Record, RecordSink, SinkConfig, SinkKind, Value, WarningChannel, WarningHandler,
};

use crate::error::DispatcherError;
use crate::sinks::{ConsoleSink, CsvSink, SchemaPolicy, TextFileSink, VizSink};

/// The hub callers log through.
///
/// Owns the registered sinks (at most one per kind, insertion order = fan-out
/// order = flush order) and the prefix stack applied to text records.
/// Deliberately single-threaded; callers needing cross-thread logging wrap it
/// themselves.
pub struct Dispatcher {
    sinks: Vec<Box<dyn RecordSink>>,
    prefixes: Vec<String>,
    warnings: WarningChannel,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            prefixes: Vec::new(),
            warnings: WarningChannel::new(),
        }
    }

    /// Create a dispatcher whose no-sink/no-match warnings go to a
    /// caller-supplied observer instead of `tracing::warn!`.
    pub fn with_warning_handler(handler: WarningHandler) -> Self {
        Self {
            sinks: Vec::new(),
            prefixes: Vec::new(),
            warnings: WarningChannel::with_handler(handler),
        }
    }

    /// Register a sink. A sink of the same kind is replaced in place,
    /// keeping its fan-out position; this is how callers reset an output.
    pub fn add_sink(&mut self, sink: Box<dyn RecordSink>) -> Result<(), DispatcherError> {
        if sink.accepted_kinds().is_empty() {
            return Err(DispatcherError::invalid_sink(format!(
                "sink '{}' accepts no record kinds",
                sink.kind()
            )));
        }
        match self.sinks.iter().position(|s| s.kind() == sink.kind()) {
            Some(pos) => self.sinks[pos] = sink,
            None => self.sinks.push(sink),
        }
        Ok(())
    }

    pub fn has_kind(&self, kind: SinkKind) -> bool {
        self.sinks.iter().any(|s| s.kind() == kind)
    }

    /// Emit a free-form text line to every text-capable sink, decorated
    /// with the current prefix stack.
    pub fn log(&mut self, message: impl Into<String>) -> Result<(), DispatcherError> {
        self.fan_out(Record::Text(message.into()))
    }

    /// Record a keyed metric into the batch of every accepting sink.
    pub fn record(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), DispatcherError> {
        self.fan_out(Record::metric(key, value))
    }

    fn fan_out(&mut self, record: Record) -> Result<(), DispatcherError> {
        if self.sinks.is_empty() {
            self.warnings.emit(LogWarning::NoSinks);
            return Ok(());
        }
        let prefix = self.prefixes.concat();
        let mut matched = 0usize;
        for sink in &mut self.sinks {
            if sink.accepts(&record) {
                sink.record(&record, &prefix)?;
                matched += 1;
            }
        }
        if matched == 0 {
            self.warnings
                .emit(LogWarning::NoMatchingSink { kind: record.kind() });
        }
        Ok(())
    }

    pub fn push_prefix(&mut self, prefix: impl Into<String>) {
        self.prefixes.push(prefix.into());
    }

    pub fn pop_prefix(&mut self) -> Result<(), DispatcherError> {
        self.prefixes
            .pop()
            .map(|_| ())
            .ok_or(DispatcherError::PrefixUnderflow)
    }

    /// Run `f` with `prefix` pushed; the pop is guaranteed balanced.
    pub fn with_prefix<T>(
        &mut self,
        prefix: impl Into<String>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.push_prefix(prefix);
        let out = f(self);
        self.prefixes.pop();
        out
    }

    /// Dump every sink, in registration order.
    pub fn dump_all(&mut self, step: Option<u64>) -> Result<(), DispatcherError> {
        for sink in &mut self.sinks {
            sink.dump(step)?;
        }
        Ok(())
    }

    /// Dump only sinks of `kind`.
    pub fn dump_kind(&mut self, kind: SinkKind, step: Option<u64>) -> Result<(), DispatcherError> {
        for sink in &mut self.sinks {
            if sink.kind() == kind {
                sink.dump(step)?;
            }
        }
        Ok(())
    }

    /// Deregister sinks of `kind`. Nothing is flushed; callers wanting final
    /// data persisted dump first. File handles release on drop.
    pub fn remove_kind(&mut self, kind: SinkKind) {
        self.sinks.retain(|s| s.kind() != kind);
    }

    /// Deregister every sink without flushing.
    pub fn remove_all(&mut self) {
        debug!(sinks = self.sinks.len(), "removing all sinks");
        self.sinks.clear();
    }

    /// Suppress warnings on the dispatcher and every registered sink.
    pub fn disable_warnings(&mut self) {
        self.warnings.disable();
        for sink in &mut self.sinks {
            sink.disable_warnings();
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to create a dispatcher from sink configs.
pub fn create_dispatcher(configs: Vec<SinkConfig>) -> Result<Dispatcher, DispatcherError> {
    let mut dispatcher = Dispatcher::new();
    for config in &configs {
        dispatcher.add_sink(create_sink(config)?)?;
    }
    Ok(dispatcher)
}

/// Create a boxed sink from configuration.
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn RecordSink>, DispatcherError> {
    let kind = config.kind;
    let key_filter = config
        .params
        .get("keys")
        .map(|raw| Regex::new(raw))
        .transpose()
        .map_err(|e| DispatcherError::sink_creation(kind, e.to_string()))?;

    match kind {
        SinkKind::Console => {
            let mut sink = ConsoleSink::new().with_timestamp(parse_timestamp(config)?);
            if let Some(filter) = key_filter {
                sink = sink.with_key_filter(filter);
            }
            Ok(Box::new(sink))
        }
        SinkKind::TextFile => {
            let mut sink = TextFileSink::new(require_path(config)?)
                .map_err(|e| DispatcherError::sink_creation(kind, e.to_string()))?
                .with_timestamp(parse_timestamp(config)?);
            if let Some(filter) = key_filter {
                sink = sink.with_key_filter(filter);
            }
            Ok(Box::new(sink))
        }
        SinkKind::Csv => {
            let policy = match config.params.get("policy").map(String::as_str) {
                None | Some("tolerant") => SchemaPolicy::Tolerant,
                Some("strict") => SchemaPolicy::Strict,
                Some(other) => {
                    return Err(DispatcherError::sink_creation(
                        kind,
                        format!("unknown policy '{other}'"),
                    ))
                }
            };
            let mut sink = CsvSink::new(require_path(config)?)
                .map_err(|e| DispatcherError::sink_creation(kind, e.to_string()))?
                .with_policy(policy);
            if let Some(filter) = key_filter {
                sink = sink.with_key_filter(filter);
            }
            Ok(Box::new(sink))
        }
        SinkKind::Viz => {
            let mut sink = VizSink::jsonl(require_path(config)?)
                .map_err(|e| DispatcherError::sink_creation(kind, e.to_string()))?;
            if let Some(axes) = config.params.get("x_axes") {
                let axes: Vec<String> = axes
                    .split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(String::from)
                    .collect();
                sink = sink.with_x_axes(axes);
            }
            if let Some(raw) = config.params.get("histogram_samples") {
                let samples = raw
                    .parse::<usize>()
                    .map_err(|e| DispatcherError::sink_creation(kind, e.to_string()))?;
                sink = sink.with_histogram_samples(samples);
            }
            if let Some(filter) = key_filter {
                sink = sink.with_key_filter(filter);
            }
            Ok(Box::new(sink))
        }
    }
}

fn require_path<'a>(config: &'a SinkConfig) -> Result<&'a String, DispatcherError> {
    config
        .params
        .get("path")
        .ok_or_else(|| DispatcherError::sink_creation(config.kind, "missing 'path' param"))
}

fn parse_timestamp(config: &SinkConfig) -> Result<bool, DispatcherError> {
    match config.params.get("timestamp") {
        None => Ok(true),
        Some(raw) => raw
            .parse::<bool>()
            .map_err(|e| DispatcherError::sink_creation(config.kind, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use runlog_contracts::{LogError, RecordKind};
    use tempfile::tempdir;

    use super::*;

    /// Test double capturing everything forwarded to it.
    struct CaptureSink {
        kind: SinkKind,
        kinds: &'static [RecordKind],
        seen: Rc<RefCell<Vec<(Option<String>, String)>>>,
        dumps: Rc<RefCell<Vec<Option<u64>>>>,
    }

    impl CaptureSink {
        fn new(kind: SinkKind, kinds: &'static [RecordKind]) -> Self {
            Self {
                kind,
                kinds,
                seen: Rc::new(RefCell::new(Vec::new())),
                dumps: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl RecordSink for CaptureSink {
        fn kind(&self) -> SinkKind {
            self.kind
        }

        fn accepted_kinds(&self) -> &[RecordKind] {
            self.kinds
        }

        fn record(&mut self, record: &Record, prefix: &str) -> Result<(), LogError> {
            let rendered = match record {
                Record::Text(message) => format!("{prefix}{message}"),
                Record::Scalar { value, .. } => value.to_string(),
                Record::Rich { .. } => "<rich>".to_string(),
            };
            self.seen
                .borrow_mut()
                .push((record.key().map(String::from), rendered));
            Ok(())
        }

        fn dump(&mut self, step: Option<u64>) -> Result<(), LogError> {
            self.dumps.borrow_mut().push(step);
            Ok(())
        }

        fn close(&mut self) -> Result<(), LogError> {
            Ok(())
        }
    }

    fn capturing_dispatcher() -> (Dispatcher, Rc<RefCell<Vec<LogWarning>>>) {
        let captured = Rc::new(RefCell::new(Vec::new()));
        let observer = Rc::clone(&captured);
        let dispatcher = Dispatcher::with_warning_handler(Box::new(move |w| {
            observer.borrow_mut().push(w.clone());
        }));
        (dispatcher, captured)
    }

    #[test]
    fn test_fan_out_respects_accepted_kinds() {
        let mut dispatcher = Dispatcher::new();
        let text_sink = CaptureSink::new(SinkKind::Console, &[RecordKind::Text]);
        let scalar_sink = CaptureSink::new(SinkKind::Csv, &[RecordKind::Scalar]);
        let text_seen = Rc::clone(&text_sink.seen);
        let scalar_seen = Rc::clone(&scalar_sink.seen);

        dispatcher.add_sink(Box::new(text_sink)).unwrap();
        dispatcher.add_sink(Box::new(scalar_sink)).unwrap();

        dispatcher.log("hello").unwrap();
        dispatcher.record("loss", 0.5).unwrap();

        assert_eq!(*text_seen.borrow(), vec![(None, "hello".to_string())]);
        assert_eq!(
            *scalar_seen.borrow(),
            vec![(Some("loss".to_string()), "0.5".to_string())]
        );
    }

    #[test]
    fn test_same_kind_replaces_in_place() {
        let mut dispatcher = Dispatcher::new();
        let first = CaptureSink::new(SinkKind::Console, &[RecordKind::Text]);
        let second = CaptureSink::new(SinkKind::Console, &[RecordKind::Text]);
        let first_seen = Rc::clone(&first.seen);
        let second_seen = Rc::clone(&second.seen);

        dispatcher.add_sink(Box::new(first)).unwrap();
        dispatcher.add_sink(Box::new(second)).unwrap();
        assert!(dispatcher.has_kind(SinkKind::Console));

        dispatcher.log("after replace").unwrap();
        assert!(first_seen.borrow().is_empty());
        assert_eq!(second_seen.borrow().len(), 1);
    }

    #[test]
    fn test_empty_accepted_kinds_is_invalid() {
        let mut dispatcher = Dispatcher::new();
        let sink = CaptureSink::new(SinkKind::Console, &[]);
        let err = dispatcher.add_sink(Box::new(sink)).unwrap_err();
        assert!(matches!(err, DispatcherError::InvalidSink { .. }));
        assert!(!dispatcher.has_kind(SinkKind::Console));
    }

    #[test]
    fn test_no_sinks_warns_once_per_call() {
        let (mut dispatcher, captured) = capturing_dispatcher();

        dispatcher.log("nobody listening").unwrap();
        dispatcher.record("loss", 1.0).unwrap();

        assert_eq!(
            *captured.borrow(),
            vec![LogWarning::NoSinks, LogWarning::NoSinks]
        );
    }

    #[test]
    fn test_unmatched_record_warns() {
        let (mut dispatcher, captured) = capturing_dispatcher();
        dispatcher
            .add_sink(Box::new(CaptureSink::new(
                SinkKind::Console,
                &[RecordKind::Text],
            )))
            .unwrap();

        dispatcher.record("loss", 1.0).unwrap();

        assert_eq!(
            *captured.borrow(),
            vec![LogWarning::NoMatchingSink {
                kind: RecordKind::Scalar
            }]
        );
    }

    #[test]
    fn test_disable_warnings_silences_dispatcher() {
        let (mut dispatcher, captured) = capturing_dispatcher();
        dispatcher.disable_warnings();
        dispatcher.log("nobody listening").unwrap();
        assert!(captured.borrow().is_empty());
    }

    #[test]
    fn test_prefix_stack_composes_outer_to_inner() {
        let mut dispatcher = Dispatcher::new();
        let sink = CaptureSink::new(SinkKind::Console, &[RecordKind::Text]);
        let seen = Rc::clone(&sink.seen);
        dispatcher.add_sink(Box::new(sink)).unwrap();

        dispatcher.push_prefix("a/");
        dispatcher.push_prefix("b/");
        dispatcher.log("x").unwrap();
        dispatcher.pop_prefix().unwrap();
        dispatcher.log("y").unwrap();
        dispatcher.pop_prefix().unwrap();

        let seen = seen.borrow();
        assert_eq!(seen[0].1, "a/b/x");
        assert_eq!(seen[1].1, "a/y");
    }

    #[test]
    fn test_pop_beyond_empty_fails() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.push_prefix("a/");
        dispatcher.pop_prefix().unwrap();
        assert!(matches!(
            dispatcher.pop_prefix(),
            Err(DispatcherError::PrefixUnderflow)
        ));
    }

    #[test]
    fn test_with_prefix_is_balanced() {
        let mut dispatcher = Dispatcher::new();
        let sink = CaptureSink::new(SinkKind::Console, &[RecordKind::Text]);
        let seen = Rc::clone(&sink.seen);
        dispatcher.add_sink(Box::new(sink)).unwrap();

        dispatcher.with_prefix("itr 0: ", |logger| logger.log("inside")).unwrap();
        dispatcher.log("outside").unwrap();

        let seen = seen.borrow();
        assert_eq!(seen[0].1, "itr 0: inside");
        assert_eq!(seen[1].1, "outside");
    }

    #[test]
    fn test_dump_all_and_dump_kind() {
        let mut dispatcher = Dispatcher::new();
        let console = CaptureSink::new(SinkKind::Console, &[RecordKind::Text]);
        let csv = CaptureSink::new(SinkKind::Csv, &[RecordKind::Scalar]);
        let console_dumps = Rc::clone(&console.dumps);
        let csv_dumps = Rc::clone(&csv.dumps);
        dispatcher.add_sink(Box::new(console)).unwrap();
        dispatcher.add_sink(Box::new(csv)).unwrap();

        dispatcher.dump_all(Some(3)).unwrap();
        dispatcher.dump_kind(SinkKind::Csv, None).unwrap();

        assert_eq!(*console_dumps.borrow(), vec![Some(3)]);
        assert_eq!(*csv_dumps.borrow(), vec![Some(3), None]);
    }

    #[test]
    fn test_remove_kind_and_remove_all() {
        let (mut dispatcher, captured) = capturing_dispatcher();
        dispatcher
            .add_sink(Box::new(CaptureSink::new(
                SinkKind::Console,
                &[RecordKind::Text],
            )))
            .unwrap();
        dispatcher
            .add_sink(Box::new(CaptureSink::new(
                SinkKind::Csv,
                &[RecordKind::Scalar],
            )))
            .unwrap();

        dispatcher.remove_kind(SinkKind::Csv);
        assert!(!dispatcher.has_kind(SinkKind::Csv));
        assert!(dispatcher.has_kind(SinkKind::Console));

        dispatcher.remove_all();
        dispatcher.log("gone").unwrap();
        assert_eq!(*captured.borrow(), vec![LogWarning::NoSinks]);
    }

    #[test]
    fn test_create_dispatcher_from_configs() {
        let dir = tempdir().unwrap();
        let configs = vec![
            SinkConfig::new(SinkKind::Console).with_param("timestamp", "false"),
            SinkConfig::new(SinkKind::Csv)
                .with_param("path", dir.path().join("out.csv").display().to_string())
                .with_param("policy", "strict"),
            SinkConfig::new(SinkKind::Viz)
                .with_param("path", dir.path().join("viz").display().to_string())
                .with_param("x_axes", "itr, epoch")
                .with_param("histogram_samples", "64"),
        ];

        let dispatcher = create_dispatcher(configs).unwrap();
        assert!(dispatcher.has_kind(SinkKind::Console));
        assert!(dispatcher.has_kind(SinkKind::Csv));
        assert!(dispatcher.has_kind(SinkKind::Viz));
    }

    #[test]
    fn test_create_sink_rejects_bad_params() {
        let missing_path = SinkConfig::new(SinkKind::Csv);
        assert!(matches!(
            create_sink(&missing_path),
            Err(DispatcherError::SinkCreation { .. })
        ));

        let bad_policy = SinkConfig::new(SinkKind::Csv)
            .with_param("path", "out.csv")
            .with_param("policy", "lenient");
        assert!(matches!(
            create_sink(&bad_policy),
            Err(DispatcherError::SinkCreation { .. })
        ));

        let bad_filter = SinkConfig::new(SinkKind::Console).with_param("keys", "([unclosed");
        assert!(matches!(
            create_sink(&bad_filter),
            Err(DispatcherError::SinkCreation { .. })
        ));
    }

    #[test]
    fn test_key_filter_routes_by_key() {
        let dir = tempdir().unwrap();
        let config = SinkConfig::new(SinkKind::Csv)
            .with_param("path", dir.path().join("out.csv").display().to_string())
            .with_param("keys", "^train/");
        let sink = create_sink(&config).unwrap();

        assert!(sink.accepts(&Record::metric("train/loss", 1.0)));
        assert!(!sink.accepts(&Record::metric("eval/loss", 1.0)));
    }
}
