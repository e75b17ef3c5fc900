//! Record publisher.
//!
//! Loads a fixed record source into memory and publishes every record as a
//! JSON event on the input topic. Delivery receipts are buffered and drained
//! without blocking the publish loop, so multiple publishes are in flight at
//! once, bounded only by the bus's queue capacity.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::bus::{EventBus, OutcomeBuffer};
use crate::config::PublisherConfig;
use crate::error::{CodecError, DriftResult};
use crate::event::Event;
use crate::record::Record;

/// How long to wait for straggler delivery outcomes after the last publish.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// An ordered, fully-loaded sequence of records.
///
/// Stands in for a real-time streaming source; the pipeline itself never
/// depends on where the records came from.
#[derive(Debug, Clone, Default)]
pub struct RecordSource {
    records: Vec<Record>,
}

impl RecordSource {
    /// Wraps an in-memory record sequence.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Loads records from a JSON-Lines file: one record object per line,
    /// blank lines ignored.
    pub fn from_jsonl_file(path: impl AsRef<Path>) -> DriftResult<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record =
                serde_json::from_str(&line).map_err(|e| CodecError::DeserializationFailed {
                    message: format!("line {}: {e}", index + 1),
                })?;
            records.push(record);
        }

        Ok(Self { records })
    }

    /// Number of records in the source.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the source holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates the records in order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}

/// Counters reported after a publish run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    /// Events handed to the bus.
    pub published: u64,
    /// Delivery outcomes resolved as acks.
    pub acked: u64,
    /// Delivery outcomes resolved as nacks.
    pub nacked: u64,
}

/// Publishes a record source onto the input topic.
pub struct RecordPublisher {
    bus: Arc<dyn EventBus>,
    cfg: PublisherConfig,
}

impl RecordPublisher {
    /// Creates a publisher after validating its configuration.
    pub fn new(bus: Arc<dyn EventBus>, cfg: PublisherConfig) -> DriftResult<Self> {
        cfg.validate()?;
        Ok(Self { bus, cfg })
    }

    /// Ensures the topic exists, then publishes every record in order.
    ///
    /// The loop never waits for an individual delivery outcome; resolved
    /// outcomes are drained opportunistically and the remainder collected at
    /// the end. Nacks are logged and counted, not retried.
    pub fn run(&self, source: &RecordSource) -> DriftResult<PublishSummary> {
        self.bus.ensure_topic_exists(&self.cfg.topic)?;

        let mut outcomes = OutcomeBuffer::new();
        let mut summary = PublishSummary::default();

        for record in source.iter() {
            let event = Event::encode_json(record)?;
            let receipt = self.bus.publish(&self.cfg.topic, event)?;
            outcomes.push(receipt);
            summary.published += 1;

            outcomes.poll();
        }

        outcomes.flush(FLUSH_TIMEOUT);
        summary.acked = outcomes.acked();
        summary.nacked = outcomes.nacked();

        info!(
            topic = %self.cfg.topic,
            published = summary.published,
            acked = summary.acked,
            nacked = summary.nacked,
            "record publish run complete"
        );

        Ok(summary)
    }
}
