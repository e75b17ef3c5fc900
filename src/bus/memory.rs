//! Embedded in-memory event bus.
//!
//! A single dispatcher thread owns all topic state: per-topic append-only
//! logs plus the live subscriber registry. Publishes and control messages
//! arrive over bounded channels and never block the caller; a slow subscriber
//! loses events (counted) rather than stalling the dispatcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use chrono::Utc;
use crossbeam_channel::{bounded, never, select, Receiver, Sender, TrySendError};

use crate::error::{DriftError, DriftResult, TransportError, ValidationError};
use crate::event::Event;

use super::delivery::{DeliveryOutcome, DeliveryReceipt};
use super::stream::{SubscriptionId, TopicStream};
use super::traits::EventBus;

/// Nack code: the target topic does not exist.
pub const NACK_TOPIC_NOT_FOUND: u32 = 404;

/// Nack code: the bus shut down before the event committed.
pub const NACK_BUS_CLOSED: u32 = 503;

/// Bus capacity configuration.
#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Max queued publishes before backpressure applies.
    pub publish_queue_capacity: usize,
    /// Max queued control messages (ensure/subscribe/unsubscribe).
    pub control_queue_capacity: usize,
    /// Per-subscription stream buffer capacity.
    ///
    /// Backlog replay on subscribe is bounded by this as well; events beyond
    /// it are dropped and counted.
    pub stream_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            publish_queue_capacity: 4096,
            control_queue_capacity: 1024,
            stream_capacity: 1024,
        }
    }
}

#[derive(Debug)]
pub(crate) enum ControlMsg {
    EnsureTopic {
        name: String,
        reply: Sender<DriftResult<()>>,
    },
    Subscribe {
        topic: String,
        subscription_id: SubscriptionId,
        stream_tx: Sender<Event>,
        reply: Sender<DriftResult<()>>,
    },
    Unsubscribe {
        subscription_id: SubscriptionId,
    },
}

#[derive(Debug)]
struct PublishMsg {
    topic: String,
    event: Event,
    outcome_tx: Sender<DeliveryOutcome>,
}

#[derive(Debug)]
struct SubscriberEntry {
    id: SubscriptionId,
    tx: Sender<Event>,
}

#[derive(Debug, Default)]
struct TopicState {
    log: Vec<Event>,
    subscribers: Vec<SubscriberEntry>,
}

/// In-process event bus backed by a dedicated dispatcher thread.
///
/// Dropping the bus closes both queues; the dispatcher drains what is already
/// enqueued, then exits, which disconnects every open [`TopicStream`].
#[derive(Debug)]
pub struct InMemoryBus {
    cfg: BusConfig,
    control_tx: Sender<ControlMsg>,
    publish_tx: Sender<PublishMsg>,
    dropped_events: Arc<AtomicU64>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl InMemoryBus {
    /// Starts the dispatcher with the given capacities.
    #[must_use]
    pub fn new(cfg: BusConfig) -> Self {
        let control_queue_capacity = cfg.control_queue_capacity.max(1);
        let publish_queue_capacity = cfg.publish_queue_capacity.max(1);

        let (control_tx, control_rx) = bounded::<ControlMsg>(control_queue_capacity);
        let (publish_tx, publish_rx) = bounded::<PublishMsg>(publish_queue_capacity);

        let dropped_events = Arc::new(AtomicU64::new(0));

        let thread_dropped = Arc::clone(&dropped_events);
        let join = thread::Builder::new()
            .name("driftwatch-bus".to_string())
            .spawn(move || dispatcher_loop(thread_dropped, control_rx, publish_rx))
            .expect("failed to spawn driftwatch bus dispatcher");

        Self {
            cfg,
            control_tx,
            publish_tx,
            dropped_events,
            join: Mutex::new(Some(join)),
        }
    }

    /// Events dropped because a subscriber's buffer was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    fn send_control(&self, msg: ControlMsg) -> DriftResult<()> {
        self.control_tx.try_send(msg).map_err(|err| match err {
            TrySendError::Full(_) => DriftError::Transport(TransportError::QueueFull {
                path: "bus_control".to_string(),
                capacity: self.cfg.control_queue_capacity,
            }),
            TrySendError::Disconnected(_) => DriftError::Transport(TransportError::Disconnected {
                path: "bus_control".to_string(),
            }),
        })
    }

    fn recv_reply<T>(rx: &Receiver<DriftResult<T>>) -> DriftResult<T> {
        rx.recv().map_err(|_| {
            DriftError::Transport(TransportError::Disconnected {
                path: "bus_control".to_string(),
            })
        })?
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl EventBus for InMemoryBus {
    fn ensure_topic_exists(&self, topic: &str) -> DriftResult<()> {
        if topic.trim().is_empty() {
            return Err(DriftError::Validation(ValidationError::EmptyTopicName));
        }

        let (reply_tx, reply_rx) = bounded::<DriftResult<()>>(1);
        self.send_control(ControlMsg::EnsureTopic {
            name: topic.to_string(),
            reply: reply_tx,
        })?;
        Self::recv_reply(&reply_rx)
    }

    fn publish(&self, topic: &str, event: Event) -> DriftResult<DeliveryReceipt> {
        let event_id = event.event_id;
        let (outcome_tx, outcome_rx) = bounded::<DeliveryOutcome>(1);

        let msg = PublishMsg {
            topic: topic.to_string(),
            event,
            outcome_tx,
        };

        match self.publish_tx.try_send(msg) {
            Ok(()) => Ok(DeliveryReceipt::new(event_id, outcome_rx)),
            Err(TrySendError::Full(_)) => Err(DriftError::Transport(TransportError::QueueFull {
                path: "bus_publish".to_string(),
                capacity: self.cfg.publish_queue_capacity,
            })),
            Err(TrySendError::Disconnected(_)) => {
                Err(DriftError::Transport(TransportError::Disconnected {
                    path: "bus_publish".to_string(),
                }))
            }
        }
    }

    fn subscribe(&self, topic: &str) -> DriftResult<TopicStream> {
        let subscription_id = SubscriptionId::new();
        let (stream_tx, stream_rx) = bounded::<Event>(self.cfg.stream_capacity.max(1));

        let (reply_tx, reply_rx) = bounded::<DriftResult<()>>(1);
        self.send_control(ControlMsg::Subscribe {
            topic: topic.to_string(),
            subscription_id,
            stream_tx,
            reply: reply_tx,
        })?;
        Self::recv_reply(&reply_rx)?;

        Ok(TopicStream::new(
            subscription_id,
            topic.to_string(),
            stream_rx,
            self.control_tx.clone(),
        ))
    }
}

impl Drop for InMemoryBus {
    fn drop(&mut self) {
        // Close channels first so the dispatcher can terminate.
        let (dummy_control_tx, _) = bounded::<ControlMsg>(1);
        drop(std::mem::replace(&mut self.control_tx, dummy_control_tx));

        let (dummy_publish_tx, _) = bounded::<PublishMsg>(1);
        drop(std::mem::replace(&mut self.publish_tx, dummy_publish_tx));

        if let Some(handle) = lock_unpoisoned(&self.join).take() {
            // Detach rather than join: the dispatcher exits on its own once
            // the queued publishes drain, and nothing here depends on when.
            drop(handle);
        }
    }
}

fn dispatcher_loop(
    dropped_events: Arc<AtomicU64>,
    control_rx: Receiver<ControlMsg>,
    publish_rx: Receiver<PublishMsg>,
) {
    let mut topics: HashMap<String, TopicState> = HashMap::new();

    let mut control_rx = control_rx;

    loop {
        select! {
            recv(control_rx) -> msg => match msg {
                Ok(msg) => handle_control(&mut topics, &dropped_events, msg),
                // Streams hold control sender clones, so this only closes
                // once the bus and every stream are gone.
                Err(_) => control_rx = never(),
            },
            recv(publish_rx) -> msg => match msg {
                Ok(msg) => handle_publish(&mut topics, &dropped_events, msg),
                // Only the bus holds the publish sender: once it closes the
                // bus is dropped and queued publishes have drained. Exiting
                // drops the per-subscriber senders, disconnecting streams.
                Err(_) => break,
            },
        }
    }
}

fn handle_control(
    topics: &mut HashMap<String, TopicState>,
    dropped_events: &AtomicU64,
    msg: ControlMsg,
) {
    match msg {
        ControlMsg::EnsureTopic { name, reply } => {
            topics.entry(name).or_default();
            let _ = reply.send(Ok(()));
        }
        ControlMsg::Subscribe {
            topic,
            subscription_id,
            stream_tx,
            reply,
        } => {
            let Some(state) = topics.get_mut(&topic) else {
                let _ = reply.send(Err(DriftError::Transport(TransportError::TopicNotFound {
                    topic,
                })));
                return;
            };

            // Replay the backlog in commit order before going live.
            for event in &state.log {
                forward(&stream_tx, event.clone(), dropped_events);
            }

            state.subscribers.push(SubscriberEntry {
                id: subscription_id,
                tx: stream_tx,
            });
            let _ = reply.send(Ok(()));
        }
        ControlMsg::Unsubscribe { subscription_id } => {
            for state in topics.values_mut() {
                state.subscribers.retain(|s| s.id != subscription_id);
            }
        }
    }
}

fn handle_publish(
    topics: &mut HashMap<String, TopicState>,
    dropped_events: &AtomicU64,
    msg: PublishMsg,
) {
    let PublishMsg {
        topic,
        event,
        outcome_tx,
    } = msg;

    let Some(state) = topics.get_mut(&topic) else {
        let _ = outcome_tx.send(DeliveryOutcome::Nack {
            event_id: event.event_id,
            code: NACK_TOPIC_NOT_FOUND,
            message: format!("topic not found: {topic}"),
        });
        return;
    };

    for subscriber in &state.subscribers {
        forward(&subscriber.tx, event.clone(), dropped_events);
    }

    let event_id = event.event_id;
    state.log.push(event);

    let _ = outcome_tx.send(DeliveryOutcome::Ack {
        event_id,
        committed: Utc::now(),
    });
}

fn forward(tx: &Sender<Event>, event: Event, dropped_events: &AtomicU64) {
    // Never block the dispatcher: drop if the subscriber is slow.
    match tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
            dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::event::Mimetype;

    fn json_event(body: &str) -> Event {
        Event::new(body.as_bytes().to_vec(), Mimetype::ApplicationJson)
    }

    #[test]
    fn ensure_topic_is_idempotent() {
        let bus = InMemoryBus::new(BusConfig::default());
        bus.ensure_topic_exists("t").unwrap();
        bus.ensure_topic_exists("t").unwrap();
    }

    #[test]
    fn ensure_topic_rejects_empty_name() {
        let bus = InMemoryBus::new(BusConfig::default());
        let err = bus.ensure_topic_exists("  ").unwrap_err();
        assert!(matches!(
            err,
            DriftError::Validation(ValidationError::EmptyTopicName)
        ));
    }

    #[test]
    fn publish_to_missing_topic_nacks() {
        let bus = InMemoryBus::new(BusConfig::default());
        let receipt = bus.publish("nowhere", json_event("{}")).unwrap();

        let outcome = receipt.wait_timeout(Duration::from_secs(1)).unwrap();
        let DeliveryOutcome::Nack { code, .. } = outcome else {
            panic!("expected nack, got {outcome:?}");
        };
        assert_eq!(code, NACK_TOPIC_NOT_FOUND);
    }

    #[test]
    fn publish_acks_with_commit_timestamp() {
        let bus = InMemoryBus::new(BusConfig::default());
        bus.ensure_topic_exists("t").unwrap();

        let before = Utc::now();
        let receipt = bus.publish("t", json_event("{}")).unwrap();
        let outcome = receipt.wait_timeout(Duration::from_secs(1)).unwrap();
        let DeliveryOutcome::Ack { committed, .. } = outcome else {
            panic!("expected ack, got {outcome:?}");
        };
        assert!(committed >= before);
    }

    #[test]
    fn subscribe_before_topic_exists_fails() {
        let bus = InMemoryBus::new(BusConfig::default());
        let err = bus.subscribe("missing").unwrap_err();
        let DriftError::Transport(TransportError::TopicNotFound { topic }) = err else {
            panic!("expected TopicNotFound, got {err:?}");
        };
        assert_eq!(topic, "missing");
    }

    #[test]
    fn backlog_is_replayed_in_publish_order() {
        let bus = InMemoryBus::new(BusConfig::default());
        bus.ensure_topic_exists("t").unwrap();

        let mut ids = Vec::new();
        for i in 0..3 {
            let event = json_event(&format!("{{\"n\": {i}}}"));
            ids.push(event.event_id);
            bus.publish("t", event)
                .unwrap()
                .wait_timeout(Duration::from_secs(1))
                .unwrap();
        }

        let stream = bus.subscribe("t").unwrap();
        for expected in ids {
            let event = stream.recv_timeout(Duration::from_secs(1)).unwrap();
            assert_eq!(event.event_id, expected);
        }
    }

    #[test]
    fn live_events_reach_existing_subscribers() {
        let bus = InMemoryBus::new(BusConfig::default());
        bus.ensure_topic_exists("t").unwrap();

        let stream = bus.subscribe("t").unwrap();
        let event = json_event("{}");
        let id = event.event_id;
        bus.publish("t", event).unwrap();

        let received = stream.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(received.event_id, id);
    }

    #[test]
    fn slow_subscriber_drops_are_counted() {
        let bus = InMemoryBus::new(BusConfig {
            publish_queue_capacity: 4096,
            control_queue_capacity: 64,
            stream_capacity: 1,
        });
        bus.ensure_topic_exists("t").unwrap();

        // Intentionally never read from the stream.
        let _stream = bus.subscribe("t").unwrap();
        for _ in 0..100 {
            bus.publish("t", json_event("{}"))
                .unwrap()
                .wait_timeout(Duration::from_secs(1))
                .unwrap();
        }

        assert!(bus.dropped_events() > 0);
    }

    #[test]
    fn dropping_bus_disconnects_streams() {
        let bus = InMemoryBus::new(BusConfig::default());
        bus.ensure_topic_exists("t").unwrap();
        let stream = bus.subscribe("t").unwrap();
        drop(bus);

        // The dispatcher drains and exits; the stream must disconnect rather
        // than block forever.
        let err = stream.recv_timeout(Duration::from_secs(1)).unwrap_err();
        assert!(matches!(
            err,
            DriftError::Transport(TransportError::Disconnected { .. })
        ));
    }
}
