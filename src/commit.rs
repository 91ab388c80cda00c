//! CommitBuilder - chain several records into a single atomic commit.
//!
//! ## Example
//!
//! ```ignore
//! // The order and its outbox record land together or not at all
//! store
//!     .batch()
//!     .insert(&order)
//!     .insert(&outbox_record)
//!     .commit()?;
//! ```

use crate::model::{Model, ModelError, ModelStore, RawWrite};

/// Builder for chaining multiple model writes into a single atomic commit.
pub struct CommitBuilder<'a, S> {
    store: &'a S,
    writes: Vec<RawWrite>,
    error: Option<ModelError>,
}

impl<'a, S: ModelStore> CommitBuilder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            writes: vec![],
            error: None,
        }
    }

    /// Queue a write that fails the batch if the record already exists.
    pub fn insert<M: Model>(self, model: &M) -> Self {
        self.queue(model, true)
    }

    /// Queue an insert-or-replace write.
    pub fn upsert<M: Model>(self, model: &M) -> Self {
        self.queue(model, false)
    }

    fn queue<M: Model>(mut self, model: &M, must_not_exist: bool) -> Self {
        if self.error.is_some() {
            return self;
        }
        match serde_json::to_vec(model) {
            Ok(bytes) => self.writes.push(RawWrite {
                key: model.storage_key(),
                bytes,
                must_not_exist,
            }),
            Err(e) => self.error = Some(e.into()),
        }
        self
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Commit all queued writes. A serialization failure on any queued
    /// record aborts the commit before the store is touched.
    pub fn commit(self) -> Result<(), ModelError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.writes.is_empty() {
            return Ok(());
        }
        self.store.commit_writes(self.writes)
    }
}

/// Extension trait to start a commit builder chain on any store.
pub trait CommitBuilderExt: ModelStore + Sized {
    fn batch(&self) -> CommitBuilder<'_, Self> {
        CommitBuilder::new(self)
    }
}

impl<S: ModelStore> CommitBuilderExt for S {}
