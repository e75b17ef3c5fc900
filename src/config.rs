//! Component configuration.
//!
//! All knobs are constructor-level: each component takes its config struct by
//! value and keeps it for the lifetime of the run. Defaults mirror the
//! original deployment (topics `river_pipeline` / `river_metrics`, alert
//! threshold 0.60, positive class 0).

use std::time::Duration;

use crate::error::ValidationError;
use crate::record::Sentiment;

/// Default input topic carrying labeled records.
pub const DEFAULT_RECORD_TOPIC: &str = "river_pipeline";

/// Default output topic carrying metric snapshots.
pub const DEFAULT_METRICS_TOPIC: &str = "river_metrics";

/// Default alert threshold for precision/recall.
pub const DEFAULT_ALERT_THRESHOLD: f64 = 0.60;

/// Default positive class for precision/recall, matching the original
/// deployment's choice of label 0.
pub const DEFAULT_POSITIVE_CLASS: Sentiment = Sentiment::Negative;

fn validate_topic(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyTopicName);
    }
    Ok(())
}

/// Record publisher configuration.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Topic the records are published to.
    pub topic: String,
}

impl PublisherConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_topic(&self.topic)
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_RECORD_TOPIC.to_string(),
        }
    }
}

/// Online learner configuration.
#[derive(Debug, Clone)]
pub struct LearnerConfig {
    /// Topic the learner consumes records from.
    pub input_topic: String,
    /// Topic the learner publishes metric snapshots to.
    pub output_topic: String,
    /// Class treated as positive when deriving precision/recall.
    pub positive_class: Sentiment,
    /// Stop consuming after this long without an event.
    ///
    /// `None` runs until the stream disconnects; the embedded bus never
    /// terminates a stream on its own, so bounded runs set a timeout.
    pub idle_timeout: Option<Duration>,
}

impl LearnerConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_topic(&self.input_topic)?;
        validate_topic(&self.output_topic)
    }
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            input_topic: DEFAULT_RECORD_TOPIC.to_string(),
            output_topic: DEFAULT_METRICS_TOPIC.to_string(),
            positive_class: DEFAULT_POSITIVE_CLASS,
            idle_timeout: None,
        }
    }
}

/// Metrics monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Topic the monitor consumes snapshots from.
    pub topic: String,
    /// Warn when a metric falls strictly below this value.
    pub threshold: f64,
    /// Stop consuming after this long without an event.
    pub idle_timeout: Option<Duration>,
}

impl MonitorConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_topic(&self.topic)?;
        if !(0.0..=1.0).contains(&self.threshold) || self.threshold.is_nan() {
            return Err(ValidationError::ThresholdOutOfRange {
                value: self.threshold,
            });
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_METRICS_TOPIC.to_string(),
            threshold: DEFAULT_ALERT_THRESHOLD,
            idle_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        PublisherConfig::default().validate().unwrap();
        LearnerConfig::default().validate().unwrap();
        MonitorConfig::default().validate().unwrap();
    }

    #[test]
    fn default_topics_match_deployment_names() {
        assert_eq!(PublisherConfig::default().topic, "river_pipeline");
        let learner = LearnerConfig::default();
        assert_eq!(learner.input_topic, "river_pipeline");
        assert_eq!(learner.output_topic, "river_metrics");
        assert_eq!(MonitorConfig::default().topic, "river_metrics");
    }

    #[test]
    fn empty_topic_is_rejected() {
        let cfg = PublisherConfig {
            topic: "  ".to_string(),
        };
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::EmptyTopicName)
        ));
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        for bad in [-0.1, 1.1, f64::NAN] {
            let cfg = MonitorConfig {
                threshold: bad,
                ..MonitorConfig::default()
            };
            assert!(cfg.validate().is_err(), "threshold {bad} should be rejected");
        }
    }

    #[test]
    fn boundary_thresholds_are_accepted() {
        for ok in [0.0, 0.60, 1.0] {
            let cfg = MonitorConfig {
                threshold: ok,
                ..MonitorConfig::default()
            };
            cfg.validate().unwrap();
        }
    }
}
