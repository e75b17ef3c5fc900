//! Abstract event-bus contract.
//!
//! The three pipeline components depend only on this trait; the embedded
//! in-memory backend implements it for tests and the bundled binary, and a
//! broker-backed backend can be layered in without touching the components.

use crate::error::DriftResult;
use crate::event::Event;

use super::delivery::DeliveryReceipt;
use super::stream::TopicStream;

/// An append-only, multi-producer/multi-consumer topic transport.
///
/// # Delivery Semantics
/// - At-least-once: a committed event is delivered to every live subscriber.
/// - Order-preserving: each subscriber observes one topic's events in commit
///   order.
pub trait EventBus: Send + Sync {
    /// Creates the topic if it does not exist. Idempotent.
    fn ensure_topic_exists(&self, topic: &str) -> DriftResult<()>;

    /// Appends an event to the topic.
    ///
    /// Returns immediately with a receipt; the commit (or failure) resolves
    /// the receipt asynchronously. Callers must not block on the receipt
    /// inside their publish loop.
    fn publish(&self, topic: &str, event: Event) -> DriftResult<DeliveryReceipt>;

    /// Opens a stream over the topic: its existing events in commit order,
    /// then live events. The stream is infinite and non-restartable.
    fn subscribe(&self, topic: &str) -> DriftResult<TopicStream>;
}
