//! Subscriber stream handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DriftError, DriftResult, TransportError};
use crate::event::Event;

use super::memory::ControlMsg;

/// Unique identifier for a subscription.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new random subscription id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A lazy, unbounded sequence of events from one topic.
///
/// Receives the topic's backlog first, then live events, in publish order.
/// The stream ends only when the bus disconnects. Dropping the stream
/// attempts best-effort unregistration.
#[derive(Debug)]
pub struct TopicStream {
    subscription_id: SubscriptionId,
    topic: String,
    rx: Receiver<Event>,
    control_tx: Sender<ControlMsg>,
    unregistered: AtomicBool,
}

impl TopicStream {
    pub(crate) fn new(
        subscription_id: SubscriptionId,
        topic: String,
        rx: Receiver<Event>,
        control_tx: Sender<ControlMsg>,
    ) -> Self {
        Self {
            subscription_id,
            topic,
            rx,
            control_tx,
            unregistered: AtomicBool::new(false),
        }
    }

    /// The subscription id backing this stream.
    #[must_use]
    pub const fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// The topic this stream consumes.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Best-effort explicit unregistration.
    ///
    /// Non-blocking and idempotent. After the dispatcher removes the
    /// subscription, the stream eventually becomes disconnected.
    pub fn unsubscribe(&self) {
        if self.unregistered.swap(true, Ordering::AcqRel) {
            return;
        }

        let _ = self.control_tx.try_send(ControlMsg::Unsubscribe {
            subscription_id: self.subscription_id,
        });
    }

    /// Receive the next event (blocking).
    pub fn recv(&self) -> DriftResult<Event> {
        self.rx.recv().map_err(|_| {
            DriftError::Transport(TransportError::Disconnected {
                path: "topic_stream".to_string(),
            })
        })
    }

    /// Receive the next event with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> DriftResult<Event> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => DriftError::Transport(TransportError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            }),
            RecvTimeoutError::Disconnected => DriftError::Transport(TransportError::Disconnected {
                path: "topic_stream".to_string(),
            }),
        })
    }
}

impl Iterator for TopicStream {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        self.recv().ok()
    }
}

impl Drop for TopicStream {
    fn drop(&mut self) {
        // Best-effort: do not block on shutdown.
        if !self.unregistered.swap(true, Ordering::AcqRel) {
            let _ = self.control_tx.try_send(ControlMsg::Unsubscribe {
                subscription_id: self.subscription_id,
            });
        }
    }
}
