//! Driftwatch pipeline runner.
//!
//! Runs one stage of the streaming pipeline over the embedded in-process
//! bus. Because the bus lives inside the process, the consumer modes first
//! run the upstream stages so there is something to consume: `subscribe`
//! publishes then learns, `metrics` publishes, learns, then monitors.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use driftwatch::bus::{BusConfig, EventBus, InMemoryBus};
use driftwatch::{
    DriftResult, LearnerConfig, MetricsMonitor, MonitorConfig, OnlineLearner, PublisherConfig,
    Record, RecordPublisher, RecordSource, Sentiment,
};

/// Consumers stop after this long without a new event.
const IDLE_TIMEOUT: Duration = Duration::from_secs(2);

struct Config {
    mode: String,
    dataset: Option<PathBuf>,
}

fn parse_args() -> Option<Config> {
    let args: Vec<String> = std::env::args().collect();
    let mode = args.get(1)?.clone();
    if !matches!(mode.as_str(), "publish" | "subscribe" | "metrics") {
        return None;
    }
    Some(Config {
        mode,
        dataset: args.get(2).map(PathBuf::from),
    })
}

fn print_usage() {
    println!("driftwatch - streaming online-learning pipeline");
    println!();
    println!("USAGE:");
    println!("    driftwatch <MODE> [DATASET]");
    println!();
    println!("MODES:");
    println!("    publish      Publish the record source to the input topic");
    println!("    subscribe    Run the online learner over the published records");
    println!("    metrics      Run the full pipeline and watch the metric stream");
    println!();
    println!("ARGS:");
    println!("    DATASET      Path to a JSON-Lines record file (one");
    println!("                 {{\"text\": ..., \"sentiment\": 0|1}} object per line).");
    println!("                 A small built-in sample is used when omitted.");
}

fn load_source(dataset: Option<&PathBuf>) -> DriftResult<RecordSource> {
    match dataset {
        Some(path) => {
            let source = RecordSource::from_jsonl_file(path)?;
            info!(path = %path.display(), records = source.len(), "loaded record source");
            Ok(source)
        }
        None => {
            let source = RecordSource::from_records(sample_records());
            info!(records = source.len(), "using built-in sample records");
            Ok(source)
        }
    }
}

fn sample_records() -> Vec<Record> {
    let samples = [
        ("The food arrived cold and the waiter ignored us all night", Sentiment::Negative),
        ("Absolutely wonderful, the pasta was fresh and the staff friendly", Sentiment::Positive),
        ("Overpriced and bland, I will not be coming back", Sentiment::Negative),
        ("Best brunch spot in town, great coffee and quick service", Sentiment::Positive),
        ("Dirty tables and a rude host ruined the evening", Sentiment::Negative),
        ("Lovely patio, generous portions, highly recommended", Sentiment::Positive),
        ("The soup tasted like dishwater and the bread was stale", Sentiment::Negative),
        ("Fantastic tasting menu, every course was a delight", Sentiment::Positive),
        ("Waited an hour for a burnt burger", Sentiment::Negative),
        ("Charming little place with delicious fresh pastries", Sentiment::Positive),
    ];

    samples
        .into_iter()
        .map(|(text, sentiment)| Record::new(text, sentiment))
        .collect()
}

fn bus_for(source: &RecordSource) -> Arc<dyn EventBus> {
    // Backlog replay is bounded by the stream buffer; size it to the dataset
    // so late subscribers see every event.
    let capacity = source.len().max(1024);
    Arc::new(InMemoryBus::new(BusConfig {
        publish_queue_capacity: capacity.max(4096),
        control_queue_capacity: 1024,
        stream_capacity: capacity,
    }))
}

fn run_publish(bus: &Arc<dyn EventBus>, source: &RecordSource) -> DriftResult<()> {
    let publisher = RecordPublisher::new(Arc::clone(bus), PublisherConfig::default())?;
    publisher.run(source)?;
    Ok(())
}

fn run_subscribe(bus: &Arc<dyn EventBus>, source: &RecordSource) -> DriftResult<()> {
    run_publish(bus, source)?;

    let cfg = LearnerConfig {
        idle_timeout: Some(IDLE_TIMEOUT),
        ..LearnerConfig::default()
    };
    let mut learner = OnlineLearner::new(Arc::clone(bus), cfg)?;
    learner.run()?;
    Ok(())
}

fn run_metrics(bus: &Arc<dyn EventBus>, source: &RecordSource) -> DriftResult<()> {
    run_subscribe(bus, source)?;

    let cfg = MonitorConfig {
        idle_timeout: Some(IDLE_TIMEOUT),
        ..MonitorConfig::default()
    };
    let monitor = MetricsMonitor::new(Arc::clone(bus), cfg)?;
    monitor.run()?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(config) = parse_args() else {
        print_usage();
        return;
    };

    let result = load_source(config.dataset.as_ref()).and_then(|source| {
        let bus = bus_for(&source);
        match config.mode.as_str() {
            "publish" => run_publish(&bus, &source),
            "subscribe" => run_subscribe(&bus, &source),
            _ => run_metrics(&bus, &source),
        }
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
