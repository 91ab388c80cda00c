//! In-memory queue for testing and single-process deployments.
//!
//! Implements both `Publisher` and `Subscriber`. All subscribers share one
//! append-only log, so events are delivered in publish order; in particular
//! events sharing a partition key are never reordered.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::{Event, PublishError, Publisher, Subscribable, Subscriber};

/// In-memory queue for testing and single-process scenarios.
///
/// ## Example
///
/// ```
/// use storefront_saga::bus::{Event, InMemoryQueue, Publisher, Subscribable, Subscriber};
///
/// let queue = InMemoryQueue::new();
/// let intents = queue.subscribe("order-intent");
///
/// queue.publish(Event::with_string_payload("evt-1", "payment-outcome", "{}")).unwrap();
/// queue.publish(Event::with_string_payload("evt-2", "order-intent", "{}")).unwrap();
///
/// // Only events of the subscribed topic are yielded
/// let event = intents.poll(10).unwrap().unwrap();
/// assert_eq!(event.id, "evt-2");
/// ```
#[derive(Clone)]
pub struct InMemoryQueue {
    /// Shared event log
    log: Arc<RwLock<Vec<Event>>>,
    /// Per-subscriber read position
    position: Arc<Mutex<usize>>,
    /// Per-subscriber topic filter
    topic: Option<String>,
    /// Nacked events waiting to be delivered again
    redeliveries: Arc<Mutex<VecDeque<Event>>>,
    /// Acknowledged event IDs
    acked: Arc<Mutex<Vec<String>>>,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> PublishError {
    PublishError::ConnectionFailed("in-memory queue lock poisoned".into())
}

impl InMemoryQueue {
    /// Create a new in-memory queue.
    pub fn new() -> Self {
        Self {
            log: Arc::new(RwLock::new(Vec::new())),
            position: Arc::new(Mutex::new(0)),
            topic: None,
            redeliveries: Arc::new(Mutex::new(VecDeque::new())),
            acked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a subscriber that sees every topic, starting at the beginning.
    pub fn new_subscriber(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            position: Arc::new(Mutex::new(0)),
            topic: None,
            redeliveries: Arc::new(Mutex::new(VecDeque::new())),
            acked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all events in the log.
    pub fn events(&self) -> Vec<Event> {
        self.log.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Find all events published on a topic.
    pub fn find_all_by_type(&self, event_type: &str) -> Vec<Event> {
        self.log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Get the total number of events in the log.
    pub fn len(&self) -> usize {
        self.log.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get acknowledged event IDs.
    pub fn acknowledged(&self) -> Vec<String> {
        self.acked.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn matches(&self, event: &Event) -> bool {
        self.topic
            .as_deref()
            .map_or(true, |topic| event.event_type == topic)
    }

    fn next_event(&self) -> Result<Option<Event>, PublishError> {
        if let Some(event) = self.redeliveries.lock().map_err(poisoned)?.pop_front() {
            return Ok(Some(event));
        }

        let log = self.log.read().map_err(poisoned)?;
        let mut pos = self.position.lock().map_err(poisoned)?;
        while *pos < log.len() {
            let event = &log[*pos];
            *pos += 1;
            if self.matches(event) {
                return Ok(Some(event.clone()));
            }
        }
        Ok(None)
    }
}

impl Publisher for InMemoryQueue {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        self.log.write().map_err(poisoned)?.push(event);
        Ok(())
    }

    fn publish_batch(&self, events: Vec<Event>) -> Result<(), PublishError> {
        self.log.write().map_err(poisoned)?.extend(events);
        Ok(())
    }
}

impl Subscriber for InMemoryQueue {
    fn poll(&self, timeout_ms: u64) -> Result<Option<Event>, PublishError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            if let Some(event) = self.next_event()? {
                return Ok(Some(event));
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }

            // Small sleep to avoid busy-waiting
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn ack(&self, event_id: &str) -> Result<(), PublishError> {
        self.acked.lock().map_err(poisoned)?.push(event_id.to_string());
        Ok(())
    }

    fn nack(&self, event_id: &str, _reason: &str) -> Result<(), PublishError> {
        let event = {
            let log = self.log.read().map_err(poisoned)?;
            log.iter()
                .rev()
                .find(|e| e.id == event_id && self.matches(e))
                .cloned()
        };
        match event {
            Some(event) => {
                self.redeliveries.lock().map_err(poisoned)?.push_back(event);
                Ok(())
            }
            None => Err(PublishError::Rejected(format!("unknown event {}", event_id))),
        }
    }
}

impl Subscribable for InMemoryQueue {
    fn subscribe(&self, topic: &str) -> Self {
        Self {
            topic: Some(topic.to_string()),
            ..self.new_subscriber()
        }
    }
}
