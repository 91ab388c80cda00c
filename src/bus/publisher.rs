//! Core publisher types for the event bus.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A message travelling over the bus.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Unique identifier, doubles as the idempotency key for redelivery.
    pub id: String,
    /// Logical topic (e.g. "order-intent", "payment-outcome").
    pub event_type: String,
    /// Partition / ordering key. Events sharing a key are delivered in order.
    pub key: Option<String>,
    /// Serialized payload (JSON).
    pub payload: Vec<u8>,
    /// Optional metadata (headers, correlation IDs, etc.)
    pub metadata: Option<Vec<(String, String)>>,
}

impl Event {
    /// Create a new event with the given topic and raw payload.
    pub fn new(id: impl Into<String>, event_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            key: None,
            payload,
            metadata: None,
        }
    }

    /// Create a keyed event with a JSON-serialized payload.
    pub fn json<T: Serialize>(
        id: impl Into<String>,
        event_type: impl Into<String>,
        key: impl Into<String>,
        payload: &T,
    ) -> Result<Self, PublishError> {
        let bytes = serde_json::to_vec(payload)
            .map_err(|e| PublishError::SerializationFailed(e.to_string()))?;
        Ok(Self::new(id, event_type, bytes).with_key(key))
    }

    /// Decode the JSON payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// Create an event with a string payload.
    pub fn with_string_payload(
        id: impl Into<String>,
        event_type: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self::new(id, event_type, payload.into().into_bytes())
    }

    /// Set the partition key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add metadata to the event.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    /// Get the payload as a string (if valid UTF-8).
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Error type for bus operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
    #[error("event rejected: {0}")]
    Rejected(String),
    #[error("publish timeout")]
    Timeout,
}

/// Trait for publishing events to a message bus.
///
/// Publishing is fire-and-forget: `Ok(())` means the bus accepted the event,
/// not that any consumer processed it.
pub trait Publisher: Send + Sync {
    /// Publish a single event to the bus.
    fn publish(&self, event: Event) -> Result<(), PublishError>;

    /// Publish multiple events to the bus.
    ///
    /// Default implementation publishes events sequentially.
    fn publish_batch(&self, events: Vec<Event>) -> Result<(), PublishError> {
        for event in events {
            self.publish(event)?;
        }
        Ok(())
    }
}

impl<P: Publisher + ?Sized> Publisher for std::sync::Arc<P> {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        (**self).publish(event)
    }

    fn publish_batch(&self, events: Vec<Event>) -> Result<(), PublishError> {
        (**self).publish_batch(events)
    }
}
