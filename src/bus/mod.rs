//! Topic-based event transport.
//!
//! Components communicate exclusively through named topics. The [`EventBus`]
//! trait is the transport contract; [`InMemoryBus`] is the embedded
//! implementation used by the binary and the tests. Publishes resolve to
//! [`DeliveryOutcome`]s through receipts rather than callbacks, and
//! subscriptions are [`TopicStream`] handles that replay a topic's backlog
//! before going live.

/// Publish receipts and outcome buffering.
pub mod delivery;
/// Embedded single-process bus.
pub mod memory;
/// Subscriber stream handle.
pub mod stream;
/// The transport contract.
pub mod traits;

pub use delivery::{DeliveryOutcome, DeliveryReceipt, OutcomeBuffer};
pub use memory::{BusConfig, InMemoryBus, NACK_BUS_CLOSED, NACK_TOPIC_NOT_FOUND};
pub use stream::{SubscriptionId, TopicStream};
pub use traits::EventBus;
