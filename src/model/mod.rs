//! Models - storage-backed records for the order side of the saga.
//!
//! Models provide a simple CRUD abstraction over a durable store: orders and
//! outbox records are both models. Every write bumps a per-record version so
//! that updates can use optimistic concurrency instead of locks.
//!
//! ## Example
//!
//! ```ignore
//! use storefront_saga::model::{InMemoryModelStore, Model, ModelStore};
//!
//! #[derive(Serialize, Deserialize, Clone)]
//! struct Coupon {
//!     pub code: String,
//!     pub percent: u8,
//! }
//!
//! impl Model for Coupon {
//!     const COLLECTION: &'static str = "coupons";
//!     fn id(&self) -> String { self.code.clone() }
//! }
//!
//! let store = InMemoryModelStore::new();
//! store.save_model(&coupon)?;
//! let loaded = store.get_model::<Coupon>("SPRING")?;
//! ```

mod in_memory;
mod store;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be stored as models.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The collection name for this model type (e.g., "orders", "outbox").
    /// Maps to a table in SQL, a collection in MongoDB, a key prefix in KV stores, etc.
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this model instance.
    fn id(&self) -> String;

    /// Storage key: `"COLLECTION:id"`.
    fn storage_key(&self) -> String {
        model_key(Self::COLLECTION, &self.id())
    }
}

pub(crate) fn model_key(collection: &str, id: &str) -> String {
    format!("{}:{}", collection, id)
}

/// A versioned wrapper around model data for optimistic concurrency control.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

/// One pre-serialized write inside an atomic batch.
#[derive(Debug, Clone)]
pub struct RawWrite {
    /// Storage key: `"COLLECTION:id"`.
    pub key: String,
    /// JSON-serialized record.
    pub bytes: Vec<u8>,
    /// Fail the whole batch if the key already exists.
    pub must_not_exist: bool,
}

/// Error type for model store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("concurrency conflict on {collection}:{id} (expected version {expected}, actual {actual})")]
    ConcurrencyConflict {
        collection: String,
        id: String,
        expected: u64,
        actual: u64,
    },
    #[error("record already exists: {key}")]
    AlreadyExists { key: String },
    #[error("model serialization error: {0}")]
    Serde(String),
    #[error("model storage error: {0}")]
    Storage(String),
    #[error("model not found: {collection}:{id}")]
    NotFound { collection: String, id: String },
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serde(err.to_string())
    }
}

pub use in_memory::InMemoryModelStore;
pub use store::ModelStore;
