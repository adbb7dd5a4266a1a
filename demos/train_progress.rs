//! Minimal runlog usage demo.
//!
//! Logs a simple progress metric simultaneously to the screen, a CSV file,
//! a text log file, and the JSON-lines visualization backend.
//!
//! Run with: `cargo run --bin train_progress`

use std::thread;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use runlog::{ConsoleSink, CsvSink, Dispatcher, Gaussian, TextFileSink, VizSink};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut logger = Dispatcher::new();
    logger.add_sink(Box::new(ConsoleSink::new()))?;
    logger.add_sink(Box::new(CsvSink::new("progress.csv")?))?;
    logger.add_sink(Box::new(TextFileSink::new("progress.txt")?))?;
    logger.add_sink(Box::new(VizSink::jsonl("viz_logdir")?))?;

    logger.log("Starting up...")?;
    for i in 0..1000 {
        logger.push_prefix(format!("itr {i}: "));
        logger.log("Running training step")?;

        thread::sleep(Duration::from_millis(10));

        let loss = 100.0 / (2 + i) as f64;
        logger.record("itr", i)?;
        logger.record("loss", loss)?;
        logger.record("loss_dist", Gaussian::new(loss, 0.1))?;

        logger.pop_prefix()?;
        logger.dump_all(None)?;
    }

    logger.remove_all();
    Ok(())
}
