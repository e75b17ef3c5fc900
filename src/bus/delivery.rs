//! Publish delivery outcomes.
//!
//! A publish call returns a [`DeliveryReceipt`] instead of taking ack/nack
//! callbacks: the bus resolves each receipt with exactly one
//! [`DeliveryOutcome`] once the event commits (or fails to). Callers are not
//! expected to block on receipts; [`OutcomeBuffer`] collects them and drains
//! resolved outcomes opportunistically so the publishing loop never stalls.

use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, warn};

use crate::event::EventId;

/// The terminal result of a single publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The event was committed to the topic log.
    Ack {
        /// The committed event.
        event_id: EventId,
        /// Commit timestamp assigned by the bus.
        committed: DateTime<Utc>,
    },

    /// The event could not be committed.
    Nack {
        /// The rejected event.
        event_id: EventId,
        /// Transport-defined error code.
        code: u32,
        /// Human-readable failure description.
        message: String,
    },
}

impl DeliveryOutcome {
    /// Returns true for an ack.
    #[must_use]
    pub const fn is_ack(&self) -> bool {
        matches!(self, Self::Ack { .. })
    }
}

/// A one-shot handle resolving to the outcome of a publish.
#[derive(Debug)]
pub struct DeliveryReceipt {
    event_id: EventId,
    rx: Receiver<DeliveryOutcome>,
}

impl DeliveryReceipt {
    pub(crate) fn new(event_id: EventId, rx: Receiver<DeliveryOutcome>) -> Self {
        Self { event_id, rx }
    }

    /// The event this receipt tracks.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Returns the outcome if it has resolved, without blocking.
    ///
    /// A disconnected bus counts as resolved: the event can no longer commit,
    /// so a synthetic nack is returned.
    #[must_use]
    pub fn try_outcome(&self) -> Option<DeliveryOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.disconnected_nack()),
        }
    }

    /// Waits for the outcome, up to `timeout`.
    ///
    /// Returns `None` if the outcome did not resolve in time.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> Option<DeliveryOutcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => None,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                Some(self.disconnected_nack())
            }
        }
    }

    fn disconnected_nack(&self) -> DeliveryOutcome {
        DeliveryOutcome::Nack {
            event_id: self.event_id,
            code: super::memory::NACK_BUS_CLOSED,
            message: "bus disconnected before commit".to_string(),
        }
    }
}

/// Collects in-flight receipts and drains resolved outcomes.
///
/// Acks are logged at DEBUG with their commit timestamp, nacks at WARN; the
/// running counts stay available for summaries.
#[derive(Debug, Default)]
pub struct OutcomeBuffer {
    pending: Vec<DeliveryReceipt>,
    acked: u64,
    nacked: u64,
}

impl OutcomeBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an in-flight receipt.
    pub fn push(&mut self, receipt: DeliveryReceipt) {
        self.pending.push(receipt);
    }

    /// Resolves every receipt that is ready, without blocking.
    pub fn poll(&mut self) {
        let mut unresolved = Vec::with_capacity(self.pending.len());
        for receipt in self.pending.drain(..) {
            match receipt.try_outcome() {
                Some(outcome) => Self::record(&mut self.acked, &mut self.nacked, &outcome),
                None => unresolved.push(receipt),
            }
        }
        self.pending = unresolved;
    }

    /// Waits for all remaining receipts, bounding each wait by `timeout`.
    ///
    /// Receipts that do not resolve in time are discarded and counted
    /// neither as acked nor nacked.
    pub fn flush(&mut self, timeout: Duration) {
        for receipt in self.pending.drain(..) {
            if let Some(outcome) = receipt.wait_timeout(timeout) {
                Self::record(&mut self.acked, &mut self.nacked, &outcome);
            } else {
                warn!(event_id = %receipt.event_id(), "delivery outcome unresolved at flush");
            }
        }
    }

    fn record(acked: &mut u64, nacked: &mut u64, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Ack {
                event_id,
                committed,
            } => {
                *acked += 1;
                debug!(%event_id, %committed, "event committed");
            }
            DeliveryOutcome::Nack {
                event_id,
                code,
                message,
            } => {
                *nacked += 1;
                warn!(%event_id, code, %message, "could not commit event");
            }
        }
    }

    /// Receipts still in flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Outcomes resolved as acks so far.
    #[must_use]
    pub const fn acked(&self) -> u64 {
        self.acked
    }

    /// Outcomes resolved as nacks so far.
    #[must_use]
    pub const fn nacked(&self) -> u64 {
        self.nacked
    }
}
