use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bus::Event;
use crate::model::Model;

/// Delivery status of an outbox record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxStatus {
    #[default]
    Pending,
    InFlight,
    Published,
    Failed,
}

/// An event waiting to be relayed to the bus.
///
/// Written in the same commit as the order it belongs to, so an event can
/// only exist if the order does, and cannot be lost once the order exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboxRecord {
    /// Equal to the event id; consumers can use it as an idempotency key.
    pub id: String,
    /// Commit sequence, used to relay in commit order.
    pub seq: i64,
    pub topic: String,
    pub key: Option<String>,
    pub payload: String,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub worker_id: Option<String>,
    pub leased_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Model for OutboxRecord {
    const COLLECTION: &'static str = "outbox";

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl OutboxRecord {
    pub fn from_event(seq: i64, event: &Event, now: DateTime<Utc>) -> Self {
        Self {
            id: event.id.clone(),
            seq,
            topic: event.event_type.clone(),
            key: event.key.clone(),
            payload: String::from_utf8_lossy(&event.payload).into_owned(),
            status: OutboxStatus::Pending,
            attempts: 0,
            last_error: None,
            worker_id: None,
            leased_until: None,
            created_at: now,
        }
    }

    /// Rebuild the bus event this record stands for.
    pub fn to_event(&self) -> Event {
        let event = Event::with_string_payload(&self.id, &self.topic, self.payload.clone());
        match &self.key {
            Some(key) => event.with_key(key),
            None => event,
        }
    }

    /// Pending, or in flight with an expired lease.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            OutboxStatus::Pending => true,
            OutboxStatus::InFlight => self.leased_until.map_or(true, |until| until <= now),
            OutboxStatus::Published | OutboxStatus::Failed => false,
        }
    }

    pub fn claim(&mut self, worker_id: &str, lease: Duration, now: DateTime<Utc>) {
        let lease = chrono::Duration::from_std(lease).unwrap_or_else(|_| chrono::Duration::seconds(60));
        self.status = OutboxStatus::InFlight;
        self.attempts += 1;
        self.worker_id = Some(worker_id.to_string());
        self.leased_until = Some(now + lease);
    }

    pub fn complete(&mut self) {
        self.status = OutboxStatus::Published;
        self.worker_id = None;
        self.leased_until = None;
    }

    pub fn release(&mut self, error: impl Into<String>) {
        self.status = OutboxStatus::Pending;
        self.last_error = Some(error.into());
        self.worker_id = None;
        self.leased_until = None;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = OutboxStatus::Failed;
        self.last_error = Some(error.into());
        self.worker_id = None;
        self.leased_until = None;
    }
}
