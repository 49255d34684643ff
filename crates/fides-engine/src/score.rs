//! Pure scoring math: recency-weighted component averages, the weighted
//! total, and the complexity-bonus model.
//!
//! Nothing in this module mutates a record or touches the clock — callers
//! pass `now` in. The engine applies the results; these functions only
//! compute them.

use chrono::{DateTime, Utc};

use fides_contracts::{
    record::{TaskComplexityEntry, TrustComponents, TrustRecord, MAX_COMPLEXITY_BONUS},
    signal::Component,
    tier::TrustTier,
};

/// Recency e-folding time for signal weighting: 7 days, in milliseconds.
const SIGNAL_RECENCY_TAU_MS: f64 = 7.0 * 24.0 * 3600.0 * 1000.0;

/// Recency e-folding time for task-complexity weighting: 3 days.
const TASK_RECENCY_TAU_MS: f64 = 3.0 * 24.0 * 3600.0 * 1000.0;

/// Components below this value get a warning factor appended.
const LOW_COMPONENT_THRESHOLD: f64 = 0.3;

/// The result of a score calculation, before the engine applies it.
#[derive(Debug, Clone)]
pub struct TrustCalculation {
    /// Weighted total in [0, 1000].
    pub score: u16,
    /// Tier derived from `score`.
    pub level: TrustTier,
    /// The recomputed sub-scores.
    pub components: TrustComponents,
    /// Human-readable warnings, one per component below 0.3.
    pub factors: Vec<String>,
}

/// Aggregate view of an entity's recent task record.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexityStats {
    pub task_count: usize,
    pub success_count: usize,
    /// Unweighted successes / total.
    pub success_rate: f64,
    /// Recency-weighted mean complexity in [1, 5].
    pub average_complexity: f64,
    /// The resulting decay dampening factor in [0, 0.8].
    pub complexity_bonus: f64,
}

/// Exponential recency weight for an observation `age_ms` old.
///
/// Negative ages (timestamps ahead of `now`) clamp to weight 1.0 so a
/// skewed clock cannot inflate a component above its signal values.
fn recency_weight(age_ms: i64, tau_ms: f64) -> f64 {
    let age = age_ms.max(0) as f64;
    (-age / tau_ms).exp()
}

/// Compute score, tier, components, and warning factors for `record`.
///
/// Each component is the recency-weighted mean of its signals (7-day
/// e-folding time). A component with no signals falls back to the value
/// stored on the record, so dimensions an entity has never been observed
/// on neither reward nor punish it.
pub fn calculate(record: &TrustRecord, now: DateTime<Utc>) -> TrustCalculation {
    let mut components = record.components;

    for component in Component::ALL {
        let mut weighted_sum = 0.0f64;
        let mut weight_total = 0.0f64;

        for signal in &record.signals {
            if signal.kind.component != component {
                continue;
            }
            let age_ms = (now - signal.timestamp).num_milliseconds();
            let weight = recency_weight(age_ms, SIGNAL_RECENCY_TAU_MS);
            weighted_sum += signal.value * weight;
            weight_total += weight;
        }

        if weight_total > 0.0 {
            components.set(component, weighted_sum / weight_total);
        }
        // No signals for this component: keep the stored fallback.
    }

    let score = components.weighted_score();
    let level = TrustTier::from_score(score);

    let mut factors = Vec::new();
    for component in Component::ALL {
        if components.get(component) < LOW_COMPONENT_THRESHOLD {
            factors.push(format!("low {} score", component));
        }
    }

    TrustCalculation {
        score,
        level,
        components,
        factors,
    }
}

/// Compute the decay dampening factor from a task record.
///
/// Recency-weighted (3-day e-folding) mean complexity, scaled by the
/// unweighted success rate:
/// `clamp((avg_complexity / 5) × success_rate × 0.8, 0, 0.8)`.
///
/// An empty task record yields 0.0 — no dampening.
pub fn complexity_bonus(tasks: &[TaskComplexityEntry], now: DateTime<Utc>) -> f64 {
    match stats_inner(tasks, now) {
        Some(stats) => stats.complexity_bonus,
        None => 0.0,
    }
}

/// Aggregate task statistics, or `None` when no tasks are recorded.
pub fn complexity_stats(
    tasks: &[TaskComplexityEntry],
    now: DateTime<Utc>,
) -> Option<ComplexityStats> {
    stats_inner(tasks, now)
}

fn stats_inner(tasks: &[TaskComplexityEntry], now: DateTime<Utc>) -> Option<ComplexityStats> {
    if tasks.is_empty() {
        return None;
    }

    let mut weighted_sum = 0.0f64;
    let mut weight_total = 0.0f64;
    let mut success_count = 0usize;

    for task in tasks {
        let age_ms = (now - task.timestamp).num_milliseconds();
        let weight = recency_weight(age_ms, TASK_RECENCY_TAU_MS);
        weighted_sum += f64::from(task.complexity) * weight;
        weight_total += weight;
        if task.success {
            success_count += 1;
        }
    }

    let average_complexity = weighted_sum / weight_total;
    let success_rate = success_count as f64 / tasks.len() as f64;
    let bonus = ((average_complexity / 5.0) * success_rate * MAX_COMPLEXITY_BONUS)
        .clamp(0.0, MAX_COMPLEXITY_BONUS);

    Some(ComplexityStats {
        task_count: tasks.len(),
        success_count,
        success_rate,
        average_complexity,
        complexity_bonus: bonus,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
