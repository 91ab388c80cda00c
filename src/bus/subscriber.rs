//! Core subscriber traits for the event bus.

use super::publisher::{Event, PublishError};

/// Trait for subscribing to events from a message bus.
///
/// This is a pull-based interface. Delivery is at-least-once: an event that
/// is nacked, or never acked, may be seen again.
pub trait Subscriber: Send + Sync {
    /// Poll for the next event, blocking until one is available or timeout.
    fn poll(&self, timeout_ms: u64) -> Result<Option<Event>, PublishError>;

    /// Acknowledge that an event has been processed.
    fn ack(&self, event_id: &str) -> Result<(), PublishError>;

    /// Reject an event so that it is redelivered.
    fn nack(&self, event_id: &str, reason: &str) -> Result<(), PublishError>;
}

/// Trait for buses that can hand out independent, topic-filtered subscribers.
pub trait Subscribable: Subscriber + Sized {
    /// Create a new subscriber that only yields events of `topic`.
    ///
    /// The new subscriber has its own read position, allowing multiple
    /// independent consumers of the same event stream.
    fn subscribe(&self, topic: &str) -> Self;
}
