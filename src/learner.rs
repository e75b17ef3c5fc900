//! Online learner.
//!
//! Consumes labeled records from the input topic and, for each one, runs the
//! predict → evaluate → publish → learn cycle. The prediction is always taken
//! before the label is learned; reordering those steps would leak the label
//! into the prediction it is meant to score. Exactly one metric snapshot is
//! published per predicted event, and none for cold-start events where the
//! model has nothing to predict with yet.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::bus::{EventBus, OutcomeBuffer, TopicStream};
use crate::config::LearnerConfig;
use crate::error::{DriftError, DriftResult, TransportError};
use crate::event::Event;
use crate::metrics::{ConfusionMatrix, MetricSnapshot};
use crate::model::SentimentModel;
use crate::record::Record;

/// How long to wait for straggler delivery outcomes after the loop ends.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Counters reported after a learner run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LearnerSummary {
    /// Events received from the input topic.
    pub events: u64,
    /// Events for which the model produced a prediction.
    pub predictions: u64,
    /// Metric snapshots published to the output topic.
    pub snapshots_published: u64,
    /// Events skipped because the payload failed to decode.
    pub decode_failures: u64,
}

/// Streams records through an incremental model, publishing running metrics.
///
/// Owns all mutable model state for its lifetime; nothing else reads or
/// writes the model or the confusion matrix.
pub struct OnlineLearner {
    bus: Arc<dyn EventBus>,
    cfg: LearnerConfig,
    model: SentimentModel,
    matrix: ConfusionMatrix,
    outcomes: OutcomeBuffer,
}

impl OnlineLearner {
    /// Creates a learner with a fresh model after validating the config.
    pub fn new(bus: Arc<dyn EventBus>, cfg: LearnerConfig) -> DriftResult<Self> {
        cfg.validate()?;
        Ok(Self {
            bus,
            cfg,
            model: SentimentModel::new(),
            matrix: ConfusionMatrix::new(),
            outcomes: OutcomeBuffer::new(),
        })
    }

    /// The learner's confusion matrix (cumulative over the run so far).
    #[must_use]
    pub const fn matrix(&self) -> &ConfusionMatrix {
        &self.matrix
    }

    /// The learner's model.
    #[must_use]
    pub const fn model(&self) -> &SentimentModel {
        &self.model
    }

    /// Ensures both topics exist, then consumes the input topic until the
    /// stream ends (or goes idle past the configured timeout).
    pub fn run(&mut self) -> DriftResult<LearnerSummary> {
        self.bus.ensure_topic_exists(&self.cfg.input_topic)?;
        self.bus.ensure_topic_exists(&self.cfg.output_topic)?;

        let stream = self.bus.subscribe(&self.cfg.input_topic)?;
        let mut summary = LearnerSummary::default();

        loop {
            let event = match self.next_event(&stream) {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(err) => return Err(err),
            };

            summary.events += 1;
            self.process_event(&event, &mut summary)?;
        }

        self.outcomes.flush(FLUSH_TIMEOUT);

        info!(
            input_topic = %self.cfg.input_topic,
            output_topic = %self.cfg.output_topic,
            events = summary.events,
            predictions = summary.predictions,
            snapshots = summary.snapshots_published,
            decode_failures = summary.decode_failures,
            "learner run complete"
        );

        Ok(summary)
    }

    fn next_event(&self, stream: &TopicStream) -> DriftResult<Option<Event>> {
        let result = match self.cfg.idle_timeout {
            None => stream.recv(),
            Some(timeout) => stream.recv_timeout(timeout),
        };

        match result {
            Ok(event) => Ok(Some(event)),
            Err(DriftError::Transport(
                TransportError::Disconnected { .. } | TransportError::Timeout { .. },
            )) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// One full cycle for one event. Step order is a hard invariant:
    /// predict, evaluate/publish, then learn.
    fn process_event(&mut self, event: &Event, summary: &mut LearnerSummary) -> DriftResult<()> {
        let record: Record = match event.decode_json() {
            Ok(record) => record,
            Err(err) => {
                warn!(event_id = %event.event_id, %err, "skipping undecodable record event");
                summary.decode_failures += 1;
                return Ok(());
            }
        };

        if let Some(y_pred) = self.model.predict(&record.text) {
            summary.predictions += 1;
            self.matrix.update(record.sentiment, y_pred);

            let snapshot = MetricSnapshot::from_matrix(&self.matrix, self.cfg.positive_class);
            debug!(
                precision = snapshot.precision,
                recall = snapshot.recall,
                y_true = %record.sentiment,
                y_pred = %y_pred,
                "prediction evaluated"
            );

            let snapshot_event = Event::encode_json(&snapshot)?;
            let receipt = self.bus.publish(&self.cfg.output_topic, snapshot_event)?;
            self.outcomes.push(receipt);
            summary.snapshots_published += 1;

            self.outcomes.poll();
        }

        self.model.learn(&record.text, record.sentiment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::bus::{BusConfig, InMemoryBus};
    use crate::event::Mimetype;
    use crate::record::Sentiment;

    const IDLE: Duration = Duration::from_millis(100);

    fn test_bus() -> Arc<InMemoryBus> {
        Arc::new(InMemoryBus::new(BusConfig::default()))
    }

    fn learner(bus: &Arc<InMemoryBus>) -> OnlineLearner {
        let cfg = LearnerConfig {
            idle_timeout: Some(IDLE),
            ..LearnerConfig::default()
        };
        OnlineLearner::new(Arc::clone(bus) as Arc<dyn EventBus>, cfg).unwrap()
    }

    fn publish_record(bus: &InMemoryBus, text: &str, sentiment: Sentiment) {
        let record = Record::new(text, sentiment);
        let event = Event::encode_json(&record).unwrap();
        bus.publish("river_pipeline", event)
            .unwrap()
            .wait_timeout(Duration::from_secs(1))
            .unwrap();
    }

    #[test]
    fn first_event_yields_no_snapshot_but_updates_model() {
        let bus = test_bus();
        bus.ensure_topic_exists("river_pipeline").unwrap();
        publish_record(&bus, "cold start", Sentiment::Negative);

        let mut learner = learner(&bus);
        let summary = learner.run().unwrap();

        assert_eq!(summary.events, 1);
        assert_eq!(summary.predictions, 0);
        assert_eq!(summary.snapshots_published, 0);
        assert_eq!(learner.model().instances(), 1);
        assert_eq!(learner.matrix().total(), 0);
    }

    #[test]
    fn one_snapshot_per_predicted_event() {
        let bus = test_bus();
        bus.ensure_topic_exists("river_pipeline").unwrap();
        for i in 0..5 {
            let label = if i % 2 == 0 {
                Sentiment::Negative
            } else {
                Sentiment::Positive
            };
            publish_record(&bus, &format!("document number {i}"), label);
        }

        let mut learner = learner(&bus);
        let summary = learner.run().unwrap();

        // The first event is cold-start; every later one predicts.
        assert_eq!(summary.events, 5);
        assert_eq!(summary.predictions, 4);
        assert_eq!(summary.snapshots_published, 4);
        assert_eq!(learner.matrix().total(), 4);

        // The output topic carries exactly the published snapshots.
        let stream = bus.subscribe("river_metrics").unwrap();
        let mut seen = 0;
        while let Ok(event) = stream.recv_timeout(Duration::from_millis(100)) {
            let snapshot: MetricSnapshot = event.decode_json().unwrap();
            assert!((0.0..=1.0).contains(&snapshot.precision));
            assert!((0.0..=1.0).contains(&snapshot.recall));
            seen += 1;
        }
        assert_eq!(seen, 4);
    }

    #[test]
    fn undecodable_events_are_skipped_not_fatal() {
        let bus = test_bus();
        bus.ensure_topic_exists("river_pipeline").unwrap();

        publish_record(&bus, "fine", Sentiment::Positive);
        let garbage = Event::new(b"not json at all".to_vec(), Mimetype::ApplicationJson);
        bus.publish("river_pipeline", garbage)
            .unwrap()
            .wait_timeout(Duration::from_secs(1))
            .unwrap();
        publish_record(&bus, "also fine", Sentiment::Positive);

        let mut learner = learner(&bus);
        let summary = learner.run().unwrap();

        assert_eq!(summary.events, 3);
        assert_eq!(summary.decode_failures, 1);
        // Cold start on the first good record, prediction on the second.
        assert_eq!(summary.predictions, 1);
    }

    #[test]
    fn matrix_total_equals_predictions() {
        let bus = test_bus();
        bus.ensure_topic_exists("river_pipeline").unwrap();
        for i in 0..10 {
            let label = if i < 5 {
                Sentiment::Negative
            } else {
                Sentiment::Positive
            };
            publish_record(&bus, &format!("text {i}"), label);
        }

        let mut learner = learner(&bus);
        let summary = learner.run().unwrap();
        assert_eq!(learner.matrix().total(), summary.predictions);
    }

    #[test]
    fn learner_creates_both_topics() {
        let bus = test_bus();
        let mut learner = learner(&bus);
        // No events published; the run ends at the idle timeout, but both
        // topics must exist afterwards.
        learner.run().unwrap();
        bus.subscribe("river_pipeline").unwrap();
        bus.subscribe("river_metrics").unwrap();
    }
}
