//! In-memory implementation of `TrustStore`.
//!
//! `InMemoryTrustStore` is the reference implementation of the `TrustStore`
//! trait. It keeps all records in a `HashMap` protected by a `Mutex`, making
//! it safe to share while the engine calls `save()`, `query()`, and
//! `delete()` from any thread.
//!
//! Real deployments substitute a database-backed provider; the engine only
//! sees the trait.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use fides_contracts::{
    entity::EntityId,
    error::{FidesError, FidesResult},
    record::TrustRecord,
};
use fides_engine::traits::TrustStore;

/// An in-memory trust record store.
///
/// # Thread safety
///
/// All trait methods acquire a `Mutex` internally. Cloning the store clones
/// the `Arc`, so clones observe the same records — useful for inspecting
/// what the engine persisted.
#[derive(Clone, Default)]
pub struct InMemoryTrustStore {
    records: Arc<Mutex<HashMap<EntityId, TrustRecord>>>,
}

impl InMemoryTrustStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().expect("store lock poisoned").len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> FidesResult<std::sync::MutexGuard<'_, HashMap<EntityId, TrustRecord>>> {
        self.records.lock().map_err(|e| FidesError::Persistence {
            reason: format!("store lock poisoned: {}", e),
        })
    }
}

impl TrustStore for InMemoryTrustStore {
    fn query(&self) -> FidesResult<Vec<TrustRecord>> {
        let records = self.lock()?;
        Ok(records.values().cloned().collect())
    }

    fn save(&self, record: &TrustRecord) -> FidesResult<()> {
        let mut records = self.lock()?;
        records.insert(record.entity_id.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, entity_id: &EntityId) -> FidesResult<()> {
        let mut records = self.lock()?;
        records.remove(entity_id);
        Ok(())
    }

    fn close(&self) -> FidesResult<()> {
        let records = self.lock()?;
        info!(record_count = records.len(), "in-memory trust store closed");
        Ok(())
    }
}
