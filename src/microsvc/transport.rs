//! Bus transport: a background lane that feeds subscribed events into a
//! [`Service`].
//!
//! Failure policy per event:
//! - success: ack.
//! - retryable failure: nack so the bus redelivers it, up to
//!   `max_deliveries`; after that the event is dead-lettered (or dropped).
//! - anything else: logged, acked and dropped, since redelivery can never
//!   succeed.
//!
//! Dead-lettering copies the event to `<topic>.dlq` with the failure in its
//! metadata.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::error::HandlerError;
use super::service::Service;
use crate::bus::{Event, Publisher, Subscriber};
use crate::events::topics;

/// Statistics from a transport thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransportStats {
    /// Events handled successfully.
    pub handled: usize,
    /// Failed handler invocations, including ones later retried.
    pub failed: usize,
    /// Events given up on.
    pub dropped: usize,
    /// Events handed back to the bus for another attempt.
    pub redelivered: usize,
    /// Events copied to a dead-letter topic.
    pub dead_lettered: usize,
    pub polls: usize,
}

#[derive(Clone)]
pub struct SubscribeOptions {
    pub poll_interval: Duration,
    pub max_deliveries: u32,
    /// Where dead letters go; `None` disables dead-lettering.
    pub dead_letter: Option<Arc<dyn Publisher>>,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            max_deliveries: 5,
            dead_letter: None,
        }
    }
}

impl SubscribeOptions {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_deliveries(mut self, max: u32) -> Self {
        self.max_deliveries = max;
        self
    }

    pub fn with_dead_letter(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.dead_letter = Some(publisher);
        self
    }
}

/// Handle to a background transport thread. Drop or call `stop()` to shut down.
pub struct TransportHandle {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<TransportStats>>,
    live: Arc<Mutex<TransportStats>>,
}

impl TransportHandle {
    /// Statistics so far, while the transport keeps running.
    pub fn stats(&self) -> TransportStats {
        *self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop the transport and wait for it to finish. Returns stats.
    pub fn stop(mut self) -> TransportStats {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => TransportStats::default(),
        }
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}

/// Consume events from `subscriber` one at a time and dispatch them to
/// `service`.
///
/// One lane is one thread: events are handled in bus order, which keeps
/// per-key order through the handler. Orders are not spread across
/// threads; scale out with more subscribers partitioned by key.
pub fn subscribe<R, S>(
    service: Arc<Service<R>>,
    subscriber: S,
    options: SubscribeOptions,
) -> TransportHandle
where
    R: Send + Sync + 'static,
    S: Subscriber + 'static,
{
    let (stop_tx, stop_rx) = channel();
    let live = Arc::new(Mutex::new(TransportStats::default()));
    let published = Arc::clone(&live);

    let handle = thread::spawn(move || {
        let mut lane = Lane {
            subscriber,
            options,
            deliveries: HashMap::new(),
            stats: TransportStats::default(),
        };

        loop {
            match stop_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            lane.stats.polls += 1;
            let timeout = lane.options.poll_interval.as_millis() as u64;
            match lane.subscriber.poll(timeout) {
                Ok(Some(event)) => {
                    let result = service.dispatch_event(&event);
                    lane.settle(&event, result.map(|_| ()));
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "poll failed");
                    thread::sleep(lane.options.poll_interval);
                }
            }
            *published.lock().unwrap_or_else(PoisonError::into_inner) = lane.stats;
        }

        info!(
            handled = lane.stats.handled,
            dropped = lane.stats.dropped,
            dead_lettered = lane.stats.dead_lettered,
            "transport stopped"
        );
        lane.stats
    });

    TransportHandle {
        stop_tx,
        handle: Some(handle),
        live,
    }
}

struct Lane<S> {
    subscriber: S,
    options: SubscribeOptions,
    /// Delivery attempts of events that have not been settled yet.
    deliveries: HashMap<String, u32>,
    stats: TransportStats,
}

impl<S: Subscriber> Lane<S> {
    fn settle(&mut self, event: &Event, result: Result<(), HandlerError>) {
        let attempt = {
            let count = self.deliveries.entry(event.id.clone()).or_insert(0);
            *count += 1;
            *count
        };

        let err = match result {
            Ok(()) => {
                debug!(event_id = %event.id, topic = %event.event_type, "event handled");
                self.stats.handled += 1;
                self.ack(event);
                return;
            }
            Err(err) => err,
        };
        self.stats.failed += 1;

        if err.is_retryable() && attempt < self.options.max_deliveries {
            warn!(
                event_id = %event.id,
                topic = %event.event_type,
                attempt,
                error = %err,
                "event handling failed, requesting redelivery"
            );
            match self.subscriber.nack(&event.id, &err.to_string()) {
                Ok(()) => {
                    self.stats.redelivered += 1;
                    return;
                }
                Err(nack_err) => {
                    error!(event_id = %event.id, error = %nack_err, "nack failed");
                }
            }
        } else if err.is_retryable() {
            error!(
                event_id = %event.id,
                topic = %event.event_type,
                attempts = attempt,
                error = %err,
                "event still failing after max deliveries"
            );
        } else {
            warn!(
                event_id = %event.id,
                topic = %event.event_type,
                error = %err,
                "event cannot be processed, dropping"
            );
        }

        self.stats.dropped += 1;
        self.dead_letter(event, &err, attempt);
        self.ack(event);
    }

    fn ack(&mut self, event: &Event) {
        self.deliveries.remove(&event.id);
        if let Err(err) = self.subscriber.ack(&event.id) {
            warn!(event_id = %event.id, error = %err, "ack failed");
        }
    }

    fn dead_letter(&mut self, event: &Event, err: &HandlerError, attempts: u32) {
        let Some(publisher) = &self.options.dead_letter else {
            return;
        };
        let copy = event
            .clone()
            .with_metadata("x-original-topic", event.event_type.clone())
            .with_metadata("x-error", err.to_string())
            .with_metadata("x-attempts", attempts.to_string());
        let copy = Event {
            event_type: topics::dead_letter(&event.event_type),
            ..copy
        };

        match publisher.publish(copy) {
            Ok(()) => {
                self.stats.dead_lettered += 1;
                warn!(
                    event_id = %event.id,
                    topic = %topics::dead_letter(&event.event_type),
                    "event dead-lettered"
                );
            }
            Err(publish_err) => {
                error!(event_id = %event.id, error = %publish_err, "dead-letter publish failed; event lost");
            }
        }
    }
}
