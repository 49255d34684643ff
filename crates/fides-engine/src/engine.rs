//! The trust engine: record ownership, signal recording, lazy decay, and
//! event emission.
//!
//! One engine instance owns every `TrustRecord`. All mutations to a record
//! happen under the engine's lock — decay, history trimming, and failure
//! pruning are multi-step read-modify-write sequences that must never
//! interleave for the same entity. Events collected during a mutation are
//! dispatched after the lock is released, and persistence runs last on a
//! clone of the committed record, so neither subscribers nor the store sit
//! on the in-memory critical path.
//!
//! There are no background timers. Decay is computed from elapsed wall-clock
//! time at the moment a record is read, which makes the result independent
//! of how often reads happen and idempotent for reads within one interval.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use fides_bus::{EventBus, SubscriptionId};
use fides_contracts::{
    entity::EntityId,
    error::{FidesError, FidesResult},
    event::{EventKind, TierDirection, TrustEvent},
    record::{HistoryEntry, TaskComplexityEntry, TrustRecord},
    signal::TrustSignal,
    tier::TrustTier,
};

use crate::{
    config::EngineConfig,
    score::{self, ComplexityStats, TrustCalculation},
    traits::TrustStore,
};

/// Minimum |score delta| for a signal to append a history entry.
const HISTORY_GATE: i32 = 10;

/// Minimum |score delta| for a signal to emit `ScoreChanged`.
const SCORE_CHANGED_GATE: i32 = 5;

/// Injectable time source. Defaults to `Utc::now`; tests substitute a
/// controlled clock to drive decay deterministically.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The behavioral trust engine.
///
/// Construct explicitly and pass by reference (or `Arc`) to consumers —
/// lifecycle is construct → `load_from_persistence()` → operate →
/// `close()`. The engine is `Send + Sync`; all methods take `&self`.
pub struct TrustEngine {
    config: EngineConfig,
    records: Mutex<HashMap<EntityId, TrustRecord>>,
    bus: EventBus<EventKind, TrustEvent>,
    store: Option<Box<dyn TrustStore>>,
    clock: Clock,
}

impl TrustEngine {
    /// Create an engine with the given configuration and no store.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            records: Mutex::new(HashMap::new()),
            bus: EventBus::new(),
            store: None,
            clock: Arc::new(Utc::now),
        }
    }

    /// Attach a storage provider.
    pub fn with_store(mut self, store: Box<dyn TrustStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Substitute the time source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Write-through is on when a store is attached and `auto_persist` is
    /// not explicitly disabled.
    fn auto_persist(&self) -> bool {
        self.store.is_some() && self.config.auto_persist.unwrap_or(true)
    }

    // ── Event subscription ───────────────────────────────────────────────────

    /// Subscribe to one event kind.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&TrustEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(kind, handler)
    }

    /// Subscribe to every event regardless of kind.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&TrustEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe_all(handler)
    }

    /// Remove a subscription. Returns false if the id is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn dispatch(&self, events: Vec<TrustEvent>) {
        for event in events {
            self.bus.emit(&event.kind(), &event);
        }
    }

    // ── Record lifecycle ─────────────────────────────────────────────────────

    /// Create a record at the floor of `initial_level`.
    ///
    /// Idempotent: an existing record is returned unchanged, so repeated
    /// initialization cannot reset earned or lost trust.
    pub fn initialize_entity(
        &self,
        entity_id: EntityId,
        initial_level: TrustTier,
    ) -> FidesResult<TrustRecord> {
        let now = self.now();
        let mut events = Vec::new();

        let (record, created) = {
            let mut records = self.records.lock().expect("trust records lock poisoned");
            if let Some(existing) = records.get(&entity_id) {
                debug!(entity_id = %entity_id, "entity already initialized");
                (existing.clone(), false)
            } else {
                let record = TrustRecord::at_tier(entity_id.clone(), initial_level, now);
                info!(
                    entity_id = %entity_id,
                    level = %record.level,
                    score = record.score,
                    "entity initialized"
                );
                events.push(TrustEvent::Initialized {
                    entity_id: entity_id.clone(),
                    level: record.level,
                    score: record.score,
                    timestamp: now,
                });
                records.insert(entity_id.clone(), record.clone());
                (record, true)
            }
        };

        self.dispatch(events);
        if created && self.auto_persist() {
            self.persist(&record)?;
        }
        Ok(record)
    }

    /// Drop the record for `entity_id`, and its persisted row when a store
    /// is configured. Returns whether a record existed.
    pub fn remove_entity(&self, entity_id: &EntityId) -> FidesResult<bool> {
        let existed = {
            let mut records = self.records.lock().expect("trust records lock poisoned");
            records.remove(entity_id).is_some()
        };

        if existed {
            info!(entity_id = %entity_id, "entity removed");
            if let Some(store) = &self.store {
                store.delete(entity_id)?;
            }
        }
        Ok(existed)
    }

    /// Ids of every entity with an in-memory record.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let records = self.records.lock().expect("trust records lock poisoned");
        records.keys().cloned().collect()
    }

    // ── Signal recording ─────────────────────────────────────────────────────

    /// Record one behavioral signal and recompute the entity's score.
    ///
    /// Unknown entities get a fresh record at the `Provisional` floor. The
    /// in-memory update always commits; a store failure is returned after
    /// the fact and never rolls the update back.
    pub fn record_signal(&self, signal: TrustSignal) -> FidesResult<()> {
        let now = self.now();
        let mut events = Vec::new();

        let updated = {
            let mut records = self.records.lock().expect("trust records lock poisoned");

            let is_new = !records.contains_key(&signal.entity_id);
            let record = records.entry(signal.entity_id.clone()).or_insert_with(|| {
                TrustRecord::at_tier(signal.entity_id.clone(), TrustTier::Provisional, now)
            });
            if is_new {
                debug!(entity_id = %signal.entity_id, "record created on first signal");
                events.push(TrustEvent::Initialized {
                    entity_id: signal.entity_id.clone(),
                    level: record.level,
                    score: record.score,
                    timestamp: now,
                });
            }

            // Failure clustering: below-threshold signals feed the rolling
            // window that activates accelerated decay.
            if signal.value < self.config.failure_threshold {
                record.recent_failures.push_back(signal.timestamp);
                record.prune_failures(self.config.failure_window(), now);
                let failure_count = record.recent_failures.len();
                let accelerated = failure_count >= self.config.min_failures_for_acceleration;
                warn!(
                    entity_id = %signal.entity_id,
                    kind = %signal.kind,
                    value = signal.value,
                    failure_count,
                    accelerated,
                    "failure signal detected"
                );
                events.push(TrustEvent::FailureDetected {
                    entity_id: signal.entity_id.clone(),
                    failure_count,
                    accelerated,
                    value: signal.value,
                    timestamp: now,
                });
            }

            let previous_score = record.score;
            let previous_level = record.level;

            record.push_signal(signal.clone());

            let calc = score::calculate(record, now);
            record.score = calc.score;
            record.level = calc.level;
            record.components = calc.components;
            record.last_calculated_at = now;

            let delta = i32::from(calc.score) - i32::from(previous_score);
            let reason = format!("signal {}", signal.kind);

            if delta.abs() >= HISTORY_GATE {
                record.push_history(HistoryEntry {
                    score: calc.score,
                    level: calc.level,
                    reason: reason.clone(),
                    timestamp: now,
                });
            }

            debug!(
                entity_id = %signal.entity_id,
                kind = %signal.kind,
                previous_score,
                new_score = calc.score,
                "signal recorded"
            );
            events.push(TrustEvent::SignalRecorded {
                entity_id: signal.entity_id.clone(),
                kind: signal.kind.clone(),
                value: signal.value,
                previous_score,
                new_score: calc.score,
                timestamp: now,
            });

            if delta.abs() >= SCORE_CHANGED_GATE {
                events.push(TrustEvent::ScoreChanged {
                    entity_id: signal.entity_id.clone(),
                    previous_score,
                    new_score: calc.score,
                    delta,
                    reason,
                    timestamp: now,
                });
            }

            // The tier event is suppressed for a record created in this
            // call: `Initialized` already announced the starting level.
            if calc.level != previous_level && !is_new {
                events.push(tier_change_event(
                    &signal.entity_id,
                    previous_level,
                    calc.level,
                    calc.score,
                    now,
                ));
            }

            record.clone()
        };

        self.dispatch(events);
        if self.auto_persist() {
            self.persist(&updated)?;
        }
        Ok(())
    }

    // ── Reads (with lazy decay) ──────────────────────────────────────────────

    /// Read an entity's record, first applying any owed decay.
    ///
    /// Reads within one decay interval of the watermark return the record
    /// unchanged; older watermarks decay by one multiplicative step per
    /// whole elapsed interval. The watermark always resets to now, so
    /// repeated sub-interval reads never compound.
    pub fn get_score(&self, entity_id: &EntityId) -> FidesResult<Option<TrustRecord>> {
        let now = self.now();
        let mut events = Vec::new();
        let mut persist_target = None;

        let snapshot = {
            let mut records = self.records.lock().expect("trust records lock poisoned");
            let Some(record) = records.get_mut(entity_id) else {
                return Ok(None);
            };

            record.prune_failures(self.config.failure_window(), now);

            let staleness = now - record.last_calculated_at;
            let interval = self.config.decay_interval();
            if staleness > interval {
                let interval_ms = interval.num_milliseconds().max(1);
                let staleness_ms = staleness.num_milliseconds();
                let periods = (staleness_ms / interval_ms).clamp(0, i64::from(i32::MAX)) as i32;

                let accelerated =
                    record.recent_failures.len() >= self.config.min_failures_for_acceleration;
                let multiplier = if accelerated {
                    self.config.accelerated_decay_multiplier
                } else {
                    1.0
                };
                let effective_rate = (self.config.decay_rate
                    * multiplier
                    * (1.0 - record.complexity_bonus))
                    .clamp(0.0, 1.0);

                let previous_score = record.score;
                let previous_level = record.level;
                let decayed = (f64::from(previous_score)
                    * (1.0 - effective_rate).powi(periods))
                .round()
                .max(0.0) as u16;

                record.score = decayed;
                record.level = TrustTier::from_score(decayed);
                record.last_calculated_at = now;

                if decayed != previous_score {
                    debug!(
                        entity_id = %entity_id,
                        previous_score,
                        new_score = decayed,
                        periods,
                        accelerated,
                        "decay applied on read"
                    );
                    events.push(TrustEvent::DecayApplied {
                        entity_id: entity_id.clone(),
                        previous_score,
                        new_score: decayed,
                        periods: periods as u32,
                        staleness_ms,
                        accelerated,
                        timestamp: now,
                    });
                    if record.level != previous_level {
                        events.push(tier_change_event(
                            entity_id,
                            previous_level,
                            record.level,
                            decayed,
                            now,
                        ));
                    }
                    persist_target = Some(record.clone());
                }
            }

            record.clone()
        };

        self.dispatch(events);
        if let Some(record) = &persist_target {
            if self.auto_persist() {
                self.persist(record)?;
            }
        }
        Ok(Some(snapshot))
    }

    /// Compute score, tier, components, and warning factors without
    /// mutating anything. `None` for unknown entities.
    pub fn calculate(&self, entity_id: &EntityId) -> Option<TrustCalculation> {
        let records = self.records.lock().expect("trust records lock poisoned");
        records
            .get(entity_id)
            .map(|record| score::calculate(record, self.now()))
    }

    // ── Task complexity ──────────────────────────────────────────────────────

    /// Record a completed task's difficulty and outcome, refreshing the
    /// entity's decay-dampening bonus.
    ///
    /// Unknown entities are a logged no-op — "never heard of this agent"
    /// is an expected condition, not an error.
    pub fn record_task_complexity(
        &self,
        entity_id: &EntityId,
        complexity: u8,
        success: bool,
        task_type: Option<String>,
    ) -> FidesResult<()> {
        let now = self.now();

        let updated = {
            let mut records = self.records.lock().expect("trust records lock poisoned");
            let Some(record) = records.get_mut(entity_id) else {
                warn!(entity_id = %entity_id, "task complexity for unknown entity ignored");
                return Ok(());
            };

            record.push_task(
                TaskComplexityEntry {
                    complexity: complexity.clamp(1, 5),
                    success,
                    timestamp: now,
                    task_type,
                },
                now,
            );
            record.complexity_bonus =
                score::complexity_bonus(record.recent_tasks.make_contiguous(), now);

            debug!(
                entity_id = %entity_id,
                complexity,
                success,
                bonus = record.complexity_bonus,
                "task complexity recorded"
            );
            record.clone()
        };

        if self.auto_persist() {
            self.persist(&updated)?;
        }
        Ok(())
    }

    // ── Introspection ────────────────────────────────────────────────────────

    /// Whether the entity currently has enough in-window failures to decay
    /// at the accelerated rate. False for unknown entities.
    pub fn is_accelerated_decay_active(&self, entity_id: &EntityId) -> bool {
        self.failure_count(entity_id) >= self.config.min_failures_for_acceleration
    }

    /// Below-threshold signals inside the failure window. 0 for unknown
    /// entities.
    pub fn failure_count(&self, entity_id: &EntityId) -> usize {
        let records = self.records.lock().expect("trust records lock poisoned");
        let Some(record) = records.get(entity_id) else {
            return 0;
        };
        let cutoff = self.now() - self.config.failure_window();
        record
            .recent_failures
            .iter()
            .filter(|ts| **ts >= cutoff)
            .count()
    }

    /// The entity's current decay-dampening bonus. 0.0 for unknown
    /// entities.
    pub fn complexity_bonus(&self, entity_id: &EntityId) -> f64 {
        let records = self.records.lock().expect("trust records lock poisoned");
        records
            .get(entity_id)
            .map(|record| record.complexity_bonus)
            .unwrap_or(0.0)
    }

    /// Aggregate task statistics. `None` for unknown or task-free
    /// entities.
    pub fn complexity_stats(&self, entity_id: &EntityId) -> Option<ComplexityStats> {
        let records = self.records.lock().expect("trust records lock poisoned");
        let record = records.get(entity_id)?;
        let tasks: Vec<TaskComplexityEntry> = record.recent_tasks.iter().cloned().collect();
        score::complexity_stats(&tasks, self.now())
    }

    // ── Persistence lifecycle ────────────────────────────────────────────────

    /// Bulk-load records from the store, replacing in-memory entries with
    /// the same entity id. Returns the number of records loaded.
    pub fn load_from_persistence(&self) -> FidesResult<usize> {
        let store = self.store.as_ref().ok_or(FidesError::PersistenceNotConfigured)?;
        let loaded = store.query()?;
        let count = loaded.len();

        let mut records = self.records.lock().expect("trust records lock poisoned");
        for record in loaded {
            records.insert(record.entity_id.clone(), record);
        }
        info!(count, "trust records loaded from persistence");
        Ok(count)
    }

    /// Save every in-memory record to the store. Returns the number
    /// saved.
    pub fn save_to_persistence(&self) -> FidesResult<usize> {
        let store = self.store.as_ref().ok_or(FidesError::PersistenceNotConfigured)?;
        let snapshot: Vec<TrustRecord> = {
            let records = self.records.lock().expect("trust records lock poisoned");
            records.values().cloned().collect()
        };

        let count = snapshot.len();
        for record in &snapshot {
            store.save(record)?;
        }
        info!(count, "trust records saved to persistence");
        Ok(count)
    }

    /// Release the storage provider, if any. The engine itself holds no
    /// other resources — there are no timers to cancel.
    pub fn close(&self) -> FidesResult<()> {
        if let Some(store) = &self.store {
            store.close()?;
        }
        Ok(())
    }

    fn persist(&self, record: &TrustRecord) -> FidesResult<()> {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(record) {
                warn!(
                    entity_id = %record.entity_id,
                    error = %e,
                    "persistence failed; in-memory record remains authoritative"
                );
                return Err(e);
            }
        }
        Ok(())
    }
}

fn tier_change_event(
    entity_id: &EntityId,
    previous_level: TrustTier,
    new_level: TrustTier,
    score: u16,
    now: DateTime<Utc>,
) -> TrustEvent {
    let direction = if new_level > previous_level {
        TierDirection::Promoted
    } else {
        TierDirection::Demoted
    };
    info!(
        entity_id = %entity_id,
        previous_level = %previous_level,
        new_level = %new_level,
        ?direction,
        "tier changed"
    );
    TrustEvent::TierChanged {
        entity_id: entity_id.clone(),
        previous_level,
        new_level,
        direction,
        score,
        timestamp: now,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
