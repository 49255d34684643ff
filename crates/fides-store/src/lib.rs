//! # fides-store
//!
//! Reference `TrustStore` implementation for the FIDES trust runtime.
//!
//! Only the in-memory provider lives here; database- or service-backed
//! providers belong to the hosting application and implement the same
//! `fides_engine::TrustStore` trait.

pub mod memory;

pub use memory::InMemoryTrustStore;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use fides_contracts::{entity::EntityId, record::TrustRecord, tier::TrustTier};
    use fides_engine::{traits::TrustStore, EngineConfig, TrustEngine};

    use super::InMemoryTrustStore;

    fn record(id: &str, tier: TrustTier) -> TrustRecord {
        TrustRecord::at_tier(
            EntityId::from(id),
            tier,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    // ── Store contract ────────────────────────────────────────────────────────

    #[test]
    fn save_is_an_upsert() {
        let store = InMemoryTrustStore::new();
        let mut rec = record("agent-1", TrustTier::Provisional);

        store.save(&rec).unwrap();
        assert_eq!(store.len(), 1);

        rec.score = 450;
        store.save(&rec).unwrap();
        assert_eq!(store.len(), 1, "saving the same entity must overwrite");
        assert_eq!(store.query().unwrap()[0].score, 450);
    }

    #[test]
    fn query_returns_all_records() {
        let store = InMemoryTrustStore::new();
        store.save(&record("agent-1", TrustTier::Provisional)).unwrap();
        store.save(&record("agent-2", TrustTier::Trusted)).unwrap();

        let mut loaded = store.query().unwrap();
        loaded.sort_by(|a, b| a.entity_id.as_str().cmp(b.entity_id.as_str()));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].entity_id.as_str(), "agent-1");
        assert_eq!(loaded[1].score, 500);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = InMemoryTrustStore::new();
        store.save(&record("agent-1", TrustTier::Provisional)).unwrap();

        store.delete(&EntityId::from("agent-1")).unwrap();
        assert!(store.is_empty());

        // Deleting an absent record is not an error.
        store.delete(&EntityId::from("agent-1")).unwrap();
    }

    #[test]
    fn close_succeeds() {
        let store = InMemoryTrustStore::new();
        store.close().unwrap();
    }

    // ── Engine round-trip ─────────────────────────────────────────────────────

    /// Records written through one engine restore into a second engine:
    /// the construct → load → operate → close lifecycle.
    #[test]
    fn engine_round_trip_through_store() {
        let store = InMemoryTrustStore::new();

        let writer = TrustEngine::new(EngineConfig::default())
            .with_store(Box::new(store.clone()));
        writer
            .initialize_entity(EntityId::from("agent-1"), TrustTier::Trusted)
            .unwrap();
        writer.close().unwrap();
        assert_eq!(store.len(), 1);

        let reader = TrustEngine::new(EngineConfig::default())
            .with_store(Box::new(store.clone()));
        assert_eq!(reader.load_from_persistence().unwrap(), 1);

        let restored = reader
            .get_score(&EntityId::from("agent-1"))
            .unwrap()
            .unwrap();
        assert_eq!(restored.score, 500);
        assert_eq!(restored.level, TrustTier::Trusted);
        reader.close().unwrap();
    }
}
