use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, warn};

use super::record::OutboxRecord;
use crate::bus::Publisher;
use crate::model::{ModelError, ModelStore};

/// Result of a batch drain operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainResult {
    pub claimed: usize,
    pub completed: usize,
    pub released: usize,
    pub failed: usize,
}

/// Relays outbox records to the bus.
///
/// Records are claimed with an optimistic update, so several workers can
/// drain the same store; a record claimed by someone else is skipped.
pub struct OutboxWorker<P> {
    publisher: P,
    worker_id: String,
    batch_size: usize,
    lease: Duration,
    max_attempts: u32,
}

impl<P> OutboxWorker<P> {
    pub fn new(publisher: P) -> Self {
        Self {
            publisher,
            worker_id: format!("relay-{}", std::process::id()),
            batch_size: 10,
            lease: Duration::from_secs(60),
            max_attempts: 3,
        }
    }

    /// Set the worker ID (used for lease tracking).
    pub fn with_worker_id(mut self, id: impl Into<String>) -> Self {
        self.worker_id = id.into();
        self
    }

    /// Set the batch size (max records to process per drain).
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the lease duration for claimed records.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Set the maximum number of attempts before failing a record.
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}

impl<P: Publisher> OutboxWorker<P> {
    /// Claim up to `batch_size` available records, oldest commit first, and
    /// publish them.
    pub fn drain<S: ModelStore>(&self, store: &S) -> Result<DrainResult, ModelError> {
        let now = Utc::now();
        let mut available = store.find_models::<OutboxRecord>(&|r| r.is_available(now))?;
        available.sort_by_key(|v| v.data.seq);

        let mut result = DrainResult::default();
        for versioned in available.into_iter().take(self.batch_size) {
            let mut record = versioned.data;
            record.claim(&self.worker_id, self.lease, now);
            let claimed_version = match store.update_model(&record, versioned.version) {
                Ok(claimed) => claimed.version,
                Err(ModelError::ConcurrencyConflict { .. }) => continue,
                Err(e) => return Err(e),
            };
            result.claimed += 1;

            match self.publisher.publish(record.to_event()) {
                Ok(()) => {
                    record.complete();
                    result.completed += 1;
                    debug!(event_id = %record.id, topic = %record.topic, "outbox record published");
                }
                Err(err) if record.attempts >= self.max_attempts => {
                    error!(
                        event_id = %record.id,
                        topic = %record.topic,
                        attempts = record.attempts,
                        error = %err,
                        "outbox record failed permanently; downstream will never see it"
                    );
                    record.fail(err.to_string());
                    result.failed += 1;
                }
                Err(err) => {
                    warn!(
                        event_id = %record.id,
                        attempts = record.attempts,
                        error = %err,
                        "outbox publish failed, releasing for retry"
                    );
                    record.release(err.to_string());
                    result.released += 1;
                }
            }
            store.update_model(&record, claimed_version)?;
        }

        Ok(result)
    }
}
