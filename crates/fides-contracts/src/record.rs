//! The trust record aggregate and its component sub-scores.
//!
//! One `TrustRecord` exists per entity, exclusively owned by the engine.
//! All of its collections are append-then-trim ring buffers — entries are
//! never reordered, and eviction always removes the oldest entry first.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{entity::EntityId, signal::Component, signal::TrustSignal, tier::TrustTier};

/// Maximum retained signals per record; oldest evicted first.
pub const MAX_SIGNALS: usize = 1000;
/// Maximum retained history entries per record.
pub const MAX_HISTORY: usize = 100;
/// Maximum retained task-complexity entries per record.
pub const MAX_TASKS: usize = 50;
/// Maximum age of a retained task-complexity entry.
pub const MAX_TASK_AGE_DAYS: i64 = 7;
/// Upper bound on the complexity-earned decay dampening factor.
pub const MAX_COMPLEXITY_BONUS: f64 = 0.8;

/// The four named sub-scores, each in [0, 1].
///
/// Serves double duty: the output of a score calculation, and the
/// per-dimension fallback used when a component has no signals to average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustComponents {
    pub behavioral: f64,
    pub compliance: f64,
    pub identity: f64,
    pub context: f64,
}

impl Default for TrustComponents {
    /// Neutral prior for an entity nothing is known about.
    fn default() -> Self {
        Self::uniform(0.5)
    }
}

impl TrustComponents {
    /// All four components set to the same value (clamped to [0, 1]).
    pub fn uniform(value: f64) -> Self {
        let v = value.clamp(0.0, 1.0);
        Self {
            behavioral: v,
            compliance: v,
            identity: v,
            context: v,
        }
    }

    /// Read the sub-score for one component.
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Behavioral => self.behavioral,
            Component::Compliance => self.compliance,
            Component::Identity => self.identity,
            Component::Context => self.context,
        }
    }

    /// Write the sub-score for one component (clamped to [0, 1]).
    pub fn set(&mut self, component: Component, value: f64) {
        let v = value.clamp(0.0, 1.0);
        match component {
            Component::Behavioral => self.behavioral = v,
            Component::Compliance => self.compliance = v,
            Component::Identity => self.identity = v,
            Component::Context => self.context = v,
        }
    }

    /// The weighted 0–1000 total: round(Σ componentᵢ × weightᵢ × 1000).
    pub fn weighted_score(&self) -> u16 {
        let total: f64 = Component::ALL
            .into_iter()
            .map(|c| self.get(c).clamp(0.0, 1.0) * c.weight())
            .sum();
        (total * 1000.0).round().clamp(0.0, 1000.0) as u16
    }
}

/// One completed task's difficulty and outcome.
///
/// Only used to compute decay dampening — tasks never feed the score
/// directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskComplexityEntry {
    /// Difficulty on [1, 5].
    pub complexity: u8,
    /// Whether the entity completed the task successfully.
    pub success: bool,
    /// When the task completed (UTC).
    pub timestamp: DateTime<Utc>,
    /// Optional free-form task category.
    pub task_type: Option<String>,
}

/// A snapshot taken when a signal moved the score by 10 or more points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub score: u16,
    pub level: TrustTier,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// The per-entity aggregate: score, tier, signal history, failure window,
/// task record, and the decay watermark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustRecord {
    pub entity_id: EntityId,
    /// Current trust score in [0, 1000].
    pub score: u16,
    /// Authority tier, always consistent with `score`.
    pub level: TrustTier,
    /// Last computed sub-scores; fallback for signal-free components.
    pub components: TrustComponents,
    /// Most recent signals, bounded to `MAX_SIGNALS`.
    pub signals: VecDeque<TrustSignal>,
    /// Major score changes, bounded to `MAX_HISTORY`.
    pub history: VecDeque<HistoryEntry>,
    /// Timestamps of recent below-threshold signals, pruned to the
    /// engine's failure window.
    pub recent_failures: VecDeque<DateTime<Utc>>,
    /// Recent completed tasks, bounded to `MAX_TASKS` and `MAX_TASK_AGE_DAYS`.
    pub recent_tasks: VecDeque<TaskComplexityEntry>,
    /// Decay dampening earned from recent hard-task successes, in [0, 0.8].
    pub complexity_bonus: f64,
    /// Watermark for lazy decay: when the score was last computed.
    pub last_calculated_at: DateTime<Utc>,
}

impl TrustRecord {
    /// A fresh record at the floor of the given tier.
    ///
    /// Components are set uniformly to `floor / 1000` so the stored
    /// sub-scores reproduce the starting score exactly.
    pub fn at_tier(entity_id: EntityId, tier: TrustTier, now: DateTime<Utc>) -> Self {
        let score = tier.floor();
        Self {
            entity_id,
            score,
            level: tier,
            components: TrustComponents::uniform(f64::from(score) / 1000.0),
            signals: VecDeque::new(),
            history: VecDeque::new(),
            recent_failures: VecDeque::new(),
            recent_tasks: VecDeque::new(),
            complexity_bonus: 0.0,
            last_calculated_at: now,
        }
    }

    /// Append a signal, evicting the oldest beyond `MAX_SIGNALS`.
    pub fn push_signal(&mut self, signal: TrustSignal) {
        self.signals.push_back(signal);
        while self.signals.len() > MAX_SIGNALS {
            self.signals.pop_front();
        }
    }

    /// Append a history entry, evicting the oldest beyond `MAX_HISTORY`.
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push_back(entry);
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }

    /// Append a task entry and prune to the size and age caps.
    pub fn push_task(&mut self, entry: TaskComplexityEntry, now: DateTime<Utc>) {
        self.recent_tasks.push_back(entry);
        let cutoff = now - Duration::days(MAX_TASK_AGE_DAYS);
        self.recent_tasks.retain(|t| t.timestamp >= cutoff);
        while self.recent_tasks.len() > MAX_TASKS {
            self.recent_tasks.pop_front();
        }
    }

    /// Drop failure timestamps older than `window` before `now`.
    pub fn prune_failures(&mut self, window: Duration, now: DateTime<Utc>) {
        let cutoff = now - window;
        self.recent_failures.retain(|ts| *ts >= cutoff);
    }
}
