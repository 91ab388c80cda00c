//! ModelStore - abstract CRUD storage for models.

use super::{Model, ModelError, RawWrite, Versioned};

/// Abstract CRUD storage for models.
///
/// Implementations must make each single-record write atomic, and
/// `commit_writes` atomic across the whole batch.
pub trait ModelStore: Send + Sync {
    /// Allocate the next identifier of a collection (auto-increment).
    fn next_id(&self, collection: &str) -> Result<i64, ModelError>;

    /// Get a model by ID. Returns None if not found.
    fn get_model<M: Model>(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError>;

    /// Upsert a model (insert or update, no version check).
    fn save_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError>;

    /// Insert a new model. Fails if it already exists.
    fn insert_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError>;

    /// Update an existing model with optimistic concurrency control.
    fn update_model<M: Model>(
        &self,
        model: &M,
        expected_version: u64,
    ) -> Result<Versioned<M>, ModelError>;

    /// Delete a model by ID. Returns true if it existed.
    fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError>;

    /// Find models matching a predicate.
    fn find_models<M: Model>(
        &self,
        predicate: &dyn Fn(&M) -> bool,
    ) -> Result<Vec<Versioned<M>>, ModelError>;

    /// Apply a batch of pre-serialized writes all-or-nothing. Used by
    /// `CommitBuilder` for type-erased atomic commits.
    fn commit_writes(&self, writes: Vec<RawWrite>) -> Result<(), ModelError>;
}
