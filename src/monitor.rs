//! Metrics monitor.
//!
//! Consumes metric snapshots from the output topic and raises a warning for
//! each tracked metric that falls strictly below the configured threshold.
//! The monitor is memoryless: every snapshot is judged on its own, with no
//! breach streaks or hysteresis.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bus::{EventBus, TopicStream};
use crate::config::MonitorConfig;
use crate::error::{DriftError, DriftResult, TransportError};
use crate::event::Event;
use crate::metrics::MetricSnapshot;

/// Which tracked metric an alert refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Precision with respect to the positive class.
    Precision,
    /// Recall with respect to the positive class.
    Recall,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Precision => f.write_str("Precision"),
            Self::Recall => f.write_str("Recall"),
        }
    }
}

/// A single threshold breach. Transient; logged, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdAlert {
    /// The breached metric.
    pub metric: MetricKind,
    /// The observed value.
    pub value: f64,
    /// The configured threshold it fell below.
    pub threshold: f64,
}

/// Counters reported after a monitor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    /// Snapshots received.
    pub snapshots: u64,
    /// Alerts raised across all snapshots.
    pub alerts: u64,
    /// Events skipped because the payload failed to decode.
    pub decode_failures: u64,
}

/// Watches the metrics topic and warns on degraded snapshots.
pub struct MetricsMonitor {
    bus: Arc<dyn EventBus>,
    cfg: MonitorConfig,
}

impl MetricsMonitor {
    /// Creates a monitor after validating its configuration.
    pub fn new(bus: Arc<dyn EventBus>, cfg: MonitorConfig) -> DriftResult<Self> {
        cfg.validate()?;
        Ok(Self { bus, cfg })
    }

    /// Evaluates one snapshot against the threshold.
    ///
    /// Comparison is strict: a metric exactly at the threshold raises
    /// nothing. Returns zero, one, or two alerts.
    #[must_use]
    pub fn check(&self, snapshot: &MetricSnapshot) -> Vec<ThresholdAlert> {
        let mut alerts = Vec::new();
        if snapshot.precision < self.cfg.threshold {
            alerts.push(ThresholdAlert {
                metric: MetricKind::Precision,
                value: snapshot.precision,
                threshold: self.cfg.threshold,
            });
        }
        if snapshot.recall < self.cfg.threshold {
            alerts.push(ThresholdAlert {
                metric: MetricKind::Recall,
                value: snapshot.recall,
                threshold: self.cfg.threshold,
            });
        }
        alerts
    }

    /// Ensures the topic exists, then consumes it until the stream ends (or
    /// goes idle past the configured timeout), warning on every breach.
    pub fn run(&self) -> DriftResult<MonitorSummary> {
        self.bus.ensure_topic_exists(&self.cfg.topic)?;

        let stream = self.bus.subscribe(&self.cfg.topic)?;
        let mut summary = MonitorSummary::default();

        loop {
            let event = match self.next_event(&stream) {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(err) => return Err(err),
            };

            let snapshot: MetricSnapshot = match event.decode_json() {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(event_id = %event.event_id, %err, "skipping undecodable snapshot event");
                    summary.decode_failures += 1;
                    continue;
                }
            };

            summary.snapshots += 1;
            for alert in self.check(&snapshot) {
                warn!(
                    threshold = alert.threshold,
                    "{} is below threshold: {}", alert.metric, alert.value
                );
                summary.alerts += 1;
            }
        }

        info!(
            topic = %self.cfg.topic,
            snapshots = summary.snapshots,
            alerts = summary.alerts,
            decode_failures = summary.decode_failures,
            "monitor run complete"
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
}
