//! InMemoryModelStore - HashMap-backed model store for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::{model_key, Model, ModelError, ModelStore, RawWrite, Versioned};

/// Internal stored representation of a model.
struct StoredModel {
    bytes: Vec<u8>,
    version: u64,
}

#[derive(Default)]
struct Tables {
    records: HashMap<String, StoredModel>,
    sequences: HashMap<String, i64>,
}

/// In-memory model store backed by a HashMap.
///
/// Storage key is `"COLLECTION:id"`. Clone-friendly via Arc: clones share
/// the same storage.
#[derive(Clone, Default)]
pub struct InMemoryModelStore {
    tables: Arc<RwLock<Tables>>,
}

fn poisoned<T>(_: PoisonError<T>) -> ModelError {
    ModelError::Storage("lock poisoned".into())
}

impl InMemoryModelStore {
    /// Create a new empty model store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored in a collection.
    pub fn count(&self, collection: &str) -> usize {
        let prefix = format!("{}:", collection);
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .count()
    }

    /// Raw stored bytes of a record, for byte-level comparisons in tests.
    pub fn raw(&self, collection: &str, id: &str) -> Option<Vec<u8>> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .get(&model_key(collection, id))
            .map(|stored| stored.bytes.clone())
    }

    fn decode<M: Model>(stored: &StoredModel) -> Result<Versioned<M>, ModelError> {
        Ok(Versioned {
            data: serde_json::from_slice(&stored.bytes)?,
            version: stored.version,
        })
    }
}

impl ModelStore for InMemoryModelStore {
    fn next_id(&self, collection: &str) -> Result<i64, ModelError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let next = tables.sequences.entry(collection.to_string()).or_insert(0);
        *next += 1;
        Ok(*next)
    }

    fn get_model<M: Model>(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError> {
        let tables = self.tables.read().map_err(poisoned)?;
        tables
            .records
            .get(&model_key(M::COLLECTION, id))
            .map(Self::decode)
            .transpose()
    }

    fn save_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        let key = model.storage_key();
        let bytes = serde_json::to_vec(model)?;

        let mut tables = self.tables.write().map_err(poisoned)?;
        let new_version = tables.records.get(&key).map(|s| s.version + 1).unwrap_or(1);
        tables.records.insert(
            key,
            StoredModel {
                bytes,
                version: new_version,
            },
        );

        Ok(Versioned {
            data: model.clone(),
            version: new_version,
        })
    }

    fn insert_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        let key = model.storage_key();
        let bytes = serde_json::to_vec(model)?;

        let mut tables = self.tables.write().map_err(poisoned)?;
        if tables.records.contains_key(&key) {
            return Err(ModelError::AlreadyExists { key });
        }
        tables
            .records
            .insert(key, StoredModel { bytes, version: 1 });

        Ok(Versioned {
            data: model.clone(),
            version: 1,
        })
    }

    fn update_model<M: Model>(
        &self,
        model: &M,
        expected_version: u64,
    ) -> Result<Versioned<M>, ModelError> {
        let key = model.storage_key();
        let bytes = serde_json::to_vec(model)?;

        let mut tables = self.tables.write().map_err(poisoned)?;
        let actual_version = tables
            .records
            .get(&key)
            .map(|s| s.version)
            .ok_or_else(|| ModelError::NotFound {
                collection: M::COLLECTION.to_string(),
                id: model.id(),
            })?;

        if actual_version != expected_version {
            return Err(ModelError::ConcurrencyConflict {
                collection: M::COLLECTION.to_string(),
                id: model.id(),
                expected: expected_version,
                actual: actual_version,
            });
        }

        let new_version = actual_version + 1;
        tables.records.insert(
            key,
            StoredModel {
                bytes,
                version: new_version,
            },
        );

        Ok(Versioned {
            data: model.clone(),
            version: new_version,
        })
    }

    fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        Ok(tables.records.remove(&model_key(M::COLLECTION, id)).is_some())
    }

    fn find_models<M: Model>(
        &self,
        predicate: &dyn Fn(&M) -> bool,
    ) -> Result<Vec<Versioned<M>>, ModelError> {
        let tables = self.tables.read().map_err(poisoned)?;
        let prefix = format!("{}:", M::COLLECTION);
        let mut results = Vec::new();

        for (key, stored) in tables.records.iter() {
            if key.starts_with(&prefix) {
                let versioned = Self::decode::<M>(stored)?;
                if predicate(&versioned.data) {
                    results.push(versioned);
                }
            }
        }

        Ok(results)
    }

    fn commit_writes(&self, writes: Vec<RawWrite>) -> Result<(), ModelError> {
        let mut tables = self.tables.write().map_err(poisoned)?;

        // Check everything before touching anything.
        for write in writes.iter().filter(|w| w.must_not_exist) {
            if tables.records.contains_key(&write.key) {
                return Err(ModelError::AlreadyExists {
                    key: write.key.clone(),
                });
            }
        }

        for write in writes {
            let version = tables
                .records
                .get(&write.key)
                .map(|s| s.version + 1)
                .unwrap_or(1);
            tables.records.insert(
                write.key,
                StoredModel {
                    bytes: write.bytes,
                    version,
                },
            );
        }

        Ok(())
    }
}
