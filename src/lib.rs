//! # Driftwatch - Streaming Online Learning with Metric Alerts
//!
//! Driftwatch streams labeled text records through an incremental classifier,
//! derives running precision/recall from every prediction, and raises alerts
//! when those metrics degrade. Three components communicate only through
//! named topics on an event bus:
//!
//! - **Record Publisher**: publishes a fixed record source onto the input topic
//! - **Online Learner**: predicts, evaluates, publishes a metric snapshot,
//!   then learns, one event at a time
//! - **Metrics Monitor**: warns when a snapshot's precision or recall falls
//!   below a threshold
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use driftwatch::bus::{BusConfig, EventBus, InMemoryBus};
//! use driftwatch::{
//!     LearnerConfig, OnlineLearner, PublisherConfig, Record, RecordPublisher, RecordSource,
//!     Sentiment,
//! };
//!
//! let bus: Arc<dyn EventBus> = Arc::new(InMemoryBus::new(BusConfig::default()));
//!
//! let source = RecordSource::from_records(vec![
//!     Record::new("great food", Sentiment::Positive),
//!     Record::new("terrible service", Sentiment::Negative),
//! ]);
//!
//! let publisher = RecordPublisher::new(Arc::clone(&bus), PublisherConfig::default())?;
//! publisher.run(&source)?;
//!
//! let mut learner = OnlineLearner::new(bus, LearnerConfig::default())?;
//! let summary = learner.run()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod record;

// Transport
pub mod bus;

// Model and pipeline components
pub mod learner;
pub mod model;
pub mod monitor;
pub mod publisher;

// Re-export primary types at crate root for convenience
pub use config::{LearnerConfig, MonitorConfig, PublisherConfig};
pub use error::{CodecError, DriftError, DriftResult, TransportError, ValidationError};
pub use event::{Event, EventId, Mimetype};
pub use learner::{LearnerSummary, OnlineLearner};
pub use metrics::{ConfusionMatrix, MetricSnapshot};
pub use model::{BagOfWords, MultinomialNb, SentimentModel};
pub use monitor::{MetricKind, MetricsMonitor, MonitorSummary, ThresholdAlert};
pub use publisher::{PublishSummary, RecordPublisher, RecordSource};
pub use record::{Record, Sentiment};

// Transport re-exports
pub use bus::{
    BusConfig, DeliveryOutcome, DeliveryReceipt, EventBus, InMemoryBus, OutcomeBuffer,
    SubscriptionId, TopicStream,
};
