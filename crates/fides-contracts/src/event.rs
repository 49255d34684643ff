//! Domain events emitted by the trust engine.
//!
//! Every mutating operation produces at least one event. Events are
//! best-effort notifications dispatched synchronously after the record
//! update commits — they are not part of the transactional boundary, and a
//! misbehaving subscriber cannot undo a score change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{entity::EntityId, signal::SignalKind, tier::TrustTier};

/// Whether a tier transition moved up or down the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierDirection {
    Promoted,
    Demoted,
}

/// Discriminant for event subscription. `TrustEvent::kind()` maps an event
/// to the key it is published under; a wildcard subscription sees all kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Initialized,
    SignalRecorded,
    ScoreChanged,
    TierChanged,
    DecayApplied,
    FailureDetected,
}

/// One typed notification from the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrustEvent {
    /// A record was created, either explicitly or on first signal.
    Initialized {
        entity_id: EntityId,
        level: TrustTier,
        score: u16,
        timestamp: DateTime<Utc>,
    },

    /// Emitted for every recorded signal, regardless of effect.
    SignalRecorded {
        entity_id: EntityId,
        kind: SignalKind,
        value: f64,
        previous_score: u16,
        new_score: u16,
        timestamp: DateTime<Utc>,
    },

    /// A signal moved the score by 5 or more points.
    ScoreChanged {
        entity_id: EntityId,
        previous_score: u16,
        new_score: u16,
        delta: i32,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The score crossed a tier boundary.
    TierChanged {
        entity_id: EntityId,
        previous_level: TrustTier,
        new_level: TrustTier,
        direction: TierDirection,
        score: u16,
        timestamp: DateTime<Utc>,
    },

    /// Lazy decay reduced the score on read.
    DecayApplied {
        entity_id: EntityId,
        previous_score: u16,
        new_score: u16,
        /// How many whole decay intervals elapsed since the watermark.
        periods: u32,
        /// Elapsed time since the watermark, in milliseconds.
        staleness_ms: i64,
        /// Whether the accelerated rate was in effect.
        accelerated: bool,
        timestamp: DateTime<Utc>,
    },

    /// A signal fell below the failure threshold.
    FailureDetected {
        entity_id: EntityId,
        /// Below-threshold signals currently inside the failure window.
        failure_count: usize,
        /// Whether this failure activated (or sustained) accelerated decay.
        accelerated: bool,
        /// The failing signal's value.
        value: f64,
        timestamp: DateTime<Utc>,
    },
}

impl TrustEvent {
    /// The subscription key this event is published under.
    pub fn kind(&self) -> EventKind {
        match self {
            TrustEvent::Initialized { .. } => EventKind::Initialized,
            TrustEvent::SignalRecorded { .. } => EventKind::SignalRecorded,
            TrustEvent::ScoreChanged { .. } => EventKind::ScoreChanged,
            TrustEvent::TierChanged { .. } => EventKind::TierChanged,
            TrustEvent::DecayApplied { .. } => EventKind::DecayApplied,
            TrustEvent::FailureDetected { .. } => EventKind::FailureDetected,
        }
    }

    /// The entity the event concerns.
    pub fn entity_id(&self) -> &EntityId {
        match self {
            TrustEvent::Initialized { entity_id, .. }
            | TrustEvent::SignalRecorded { entity_id, .. }
            | TrustEvent::ScoreChanged { entity_id, .. }
            | TrustEvent::TierChanged { entity_id, .. }
            | TrustEvent::DecayApplied { entity_id, .. }
            | TrustEvent::FailureDetected { entity_id, .. } => entity_id,
        }
    }
}
