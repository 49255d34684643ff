//! Storage contract for trust record persistence.
//!
//! The engine performs no I/O of its own. When a `TrustStore` is injected,
//! every committed record mutation is followed by a best-effort `save()`
//! (when auto-persist is on), `load_from_persistence()` bulk-loads at
//! startup, and `remove_entity()` deletes the backing row. The in-memory
//! record is always applied *before* the store is called, and a store
//! failure never rolls it back.

use fides_contracts::{entity::EntityId, error::FidesResult, record::TrustRecord};

/// A pluggable persistence backend for trust records.
///
/// Implementations are **trusted** collaborators. They define their own
/// serialization of `TrustRecord` (the field set is JSON-compatible) and
/// their own timeout/cancellation behavior — the engine imposes none.
pub trait TrustStore: Send + Sync {
    /// Bulk-load every persisted record. Used at startup.
    fn query(&self) -> FidesResult<Vec<TrustRecord>>;

    /// Upsert one record keyed by its entity id.
    fn save(&self, record: &TrustRecord) -> FidesResult<()>;

    /// Delete the record for `entity_id`. Deleting an absent record is not
    /// an error.
    fn delete(&self, entity_id: &EntityId) -> FidesResult<()>;

    /// Release provider resources. Called once from `TrustEngine::close()`.
    fn close(&self) -> FidesResult<()>;
}
