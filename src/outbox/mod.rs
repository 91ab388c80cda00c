//! Transactional outbox.
//!
//! Events are written as [`OutboxRecord`] models in the same commit as the
//! state change that produced them. An [`OutboxWorker`] later claims the
//! records and publishes them, so the bus sees every committed event at
//! least once and never sees an event whose commit failed.

mod record;
mod thread;
mod worker;

pub use record::{OutboxRecord, OutboxStatus};
pub use thread::{OutboxWorkerThread, WorkerStats};
pub use worker::{DrainResult, OutboxWorker};
