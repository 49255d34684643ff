//! # fides-contracts
//!
//! Shared types, schemas, and contracts for the FIDES trust runtime.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions, the tier table, and error types.

pub mod entity;
pub mod error;
pub mod event;
pub mod record;
pub mod signal;
pub mod tier;

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use entity::EntityId;
    use error::FidesError;
    use event::{EventKind, TrustEvent};
    use record::{TaskComplexityEntry, TrustComponents, TrustRecord, MAX_HISTORY, MAX_SIGNALS};
    use signal::{Component, SignalKind, TrustSignal};
    use tier::TrustTier;

    fn ts(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    // ── SignalKind parsing ───────────────────────────────────────────────────

    #[test]
    fn signal_kind_parses_dotted_form() {
        let kind: SignalKind = "behavioral.task_success".parse().unwrap();
        assert_eq!(kind.component, Component::Behavioral);
        assert_eq!(kind.subtype, "task_success");
    }

    #[test]
    fn signal_kind_parses_every_component_prefix() {
        for component in Component::ALL {
            let raw = format!("{}.probe", component.prefix());
            let kind: SignalKind = raw.parse().unwrap();
            assert_eq!(kind.component, component);
        }
    }

    #[test]
    fn signal_kind_rejects_unknown_prefix() {
        let err = "telemetry.latency".parse::<SignalKind>().unwrap_err();
        match err {
            FidesError::UnknownComponent { prefix } => assert_eq!(prefix, "telemetry"),
            other => panic!("expected UnknownComponent, got {:?}", other),
        }
    }

    #[test]
    fn signal_kind_display_round_trips() {
        let kind = SignalKind::new(Component::Compliance, "policy_check");
        let rendered = kind.to_string();
        assert_eq!(rendered, "compliance.policy_check");
        assert_eq!(rendered.parse::<SignalKind>().unwrap(), kind);
    }

    // ── TrustSignal ──────────────────────────────────────────────────────────

    #[test]
    fn trust_signal_clamps_value() {
        let kind = SignalKind::new(Component::Behavioral, "task_success");
        let high = TrustSignal::new(EntityId::from("a"), kind.clone(), 1.7, ts(0));
        let low = TrustSignal::new(EntityId::from("a"), kind, -0.2, ts(0));
        assert_eq!(high.value, 1.0);
        assert_eq!(low.value, 0.0);
    }

    // ── Component weights ────────────────────────────────────────────────────

    #[test]
    fn component_weights_sum_to_one() {
        let total: f64 = Component::ALL.into_iter().map(Component::weight).sum();
        assert!((total - 1.0).abs() < 1e-12, "weights must sum to 1.0, got {}", total);
    }

    #[test]
    fn weighted_score_bounds() {
        assert_eq!(TrustComponents::uniform(1.0).weighted_score(), 1000);
        assert_eq!(TrustComponents::uniform(0.0).weighted_score(), 0);
        assert_eq!(TrustComponents::uniform(0.5).weighted_score(), 500);
    }

    #[test]
    fn weighted_score_uses_fixed_weights() {
        let mut components = TrustComponents::uniform(0.0);
        components.set(Component::Behavioral, 1.0);
        // 1.0 × 0.40 × 1000
        assert_eq!(components.weighted_score(), 400);
    }

    // ── Tier table ───────────────────────────────────────────────────────────

    #[test]
    fn tier_bands_are_contiguous_over_full_range() {
        let mut expected_min = 0u16;
        for tier in TrustTier::ALL {
            let (min, max) = tier.band();
            assert_eq!(min, expected_min, "band for {} must start at {}", tier, expected_min);
            expected_min = max + 1;
        }
        assert_eq!(expected_min, 1001, "bands must cover 0..=1000 exactly");
    }

    #[test]
    fn tier_from_score_boundaries() {
        assert_eq!(TrustTier::from_score(0), TrustTier::Sandbox);
        assert_eq!(TrustTier::from_score(99), TrustTier::Sandbox);
        assert_eq!(TrustTier::from_score(100), TrustTier::Provisional);
        assert_eq!(TrustTier::from_score(299), TrustTier::Provisional);
        assert_eq!(TrustTier::from_score(300), TrustTier::Standard);
        assert_eq!(TrustTier::from_score(500), TrustTier::Trusted);
        assert_eq!(TrustTier::from_score(700), TrustTier::Certified);
        assert_eq!(TrustTier::from_score(899), TrustTier::Certified);
        assert_eq!(TrustTier::from_score(900), TrustTier::Autonomous);
        assert_eq!(TrustTier::from_score(1000), TrustTier::Autonomous);
    }

    #[test]
    fn tier_ordering_follows_levels() {
        assert!(TrustTier::Sandbox < TrustTier::Provisional);
        assert!(TrustTier::Certified < TrustTier::Autonomous);
        assert_eq!(TrustTier::Standard.level(), 2);
    }

    // ── TrustRecord collections ──────────────────────────────────────────────

    #[test]
    fn record_at_tier_matches_components_to_score() {
        let record = TrustRecord::at_tier(EntityId::from("a"), TrustTier::Provisional, ts(0));
        assert_eq!(record.score, 100);
        assert_eq!(record.level, TrustTier::Provisional);
        // Uniform components must reproduce the starting score exactly.
        assert_eq!(record.components.weighted_score(), 100);
        assert!(record.signals.is_empty());
        assert_eq!(record.complexity_bonus, 0.0);
    }

    #[test]
    fn record_signal_cap_keeps_most_recent() {
        let mut record = TrustRecord::at_tier(EntityId::from("a"), TrustTier::Provisional, ts(0));
        let kind = SignalKind::new(Component::Behavioral, "probe");
        for i in 0..1500i64 {
            record.push_signal(TrustSignal::new(
                EntityId::from("a"),
                kind.clone(),
                0.5,
                ts(i),
            ));
        }
        assert_eq!(record.signals.len(), MAX_SIGNALS);
        // The 1000 most recent by arrival order: timestamps 500..1499.
        assert_eq!(record.signals.front().unwrap().timestamp, ts(500));
        assert_eq!(record.signals.back().unwrap().timestamp, ts(1499));
    }

    #[test]
    fn record_history_cap() {
        let mut record = TrustRecord::at_tier(EntityId::from("a"), TrustTier::Provisional, ts(0));
        for i in 0..120u16 {
            record.push_history(record::HistoryEntry {
                score: i,
                level: TrustTier::Sandbox,
                reason: format!("change {}", i),
                timestamp: ts(i64::from(i)),
            });
        }
        assert_eq!(record.history.len(), MAX_HISTORY);
        assert_eq!(record.history.front().unwrap().score, 20);
    }

    #[test]
    fn record_task_pruning_by_count_and_age() {
        let mut record = TrustRecord::at_tier(EntityId::from("a"), TrustTier::Provisional, ts(0));
        let now = ts(0);

        // One stale entry, eight days old.
        record.push_task(
            TaskComplexityEntry {
                complexity: 3,
                success: true,
                timestamp: now - Duration::days(8),
                task_type: None,
            },
            now,
        );
        assert!(record.recent_tasks.is_empty(), "stale task must be pruned");

        for i in 0..60i64 {
            record.push_task(
                TaskComplexityEntry {
                    complexity: 3,
                    success: true,
                    timestamp: now - Duration::minutes(60 - i),
                    task_type: None,
                },
                now,
            );
        }
        assert_eq!(record.recent_tasks.len(), record::MAX_TASKS);
    }

    #[test]
    fn record_failure_pruning() {
        let mut record = TrustRecord::at_tier(EntityId::from("a"), TrustTier::Provisional, ts(0));
        let now = ts(7200);
        record.recent_failures.push_back(now - Duration::hours(2));
        record.recent_failures.push_back(now - Duration::minutes(30));
        record.recent_failures.push_back(now - Duration::minutes(1));

        record.prune_failures(Duration::hours(1), now);
        assert_eq!(record.recent_failures.len(), 2);
    }

    // ── Serde boundary ───────────────────────────────────────────────────────

    #[test]
    fn record_serde_round_trips() {
        let mut record = TrustRecord::at_tier(EntityId::from("agent-1"), TrustTier::Standard, ts(0));
        record.push_signal(TrustSignal::new(
            EntityId::from("agent-1"),
            SignalKind::new(Component::Identity, "attested"),
            0.9,
            ts(5),
        ));
        let json = serde_json::to_string(&record).unwrap();
        // Timestamps must serialize as ISO-8601 strings at the boundary.
        assert!(json.contains("2023-"));
        let decoded: TrustRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.entity_id, record.entity_id);
        assert_eq!(decoded.score, record.score);
        assert_eq!(decoded.signals.len(), 1);
    }

    // ── Events ───────────────────────────────────────────────────────────────

    #[test]
    fn event_kind_mapping() {
        let event = TrustEvent::FailureDetected {
            entity_id: EntityId::from("a"),
            failure_count: 2,
            accelerated: true,
            value: 0.1,
            timestamp: ts(0),
        };
        assert_eq!(event.kind(), EventKind::FailureDetected);
        assert_eq!(event.entity_id().as_str(), "a");
    }

    // ── FidesError display messages ──────────────────────────────────────────

    #[test]
    fn error_unknown_component_display() {
        let err = FidesError::UnknownComponent {
            prefix: "telemetry".to_string(),
        };
        assert!(err.to_string().contains("telemetry"));
    }

    #[test]
    fn error_persistence_not_configured_display() {
        let err = FidesError::PersistenceNotConfigured;
        assert!(err.to_string().contains("not configured"));
    }

    #[test]
    fn error_persistence_display() {
        let err = FidesError::Persistence {
            reason: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("persistence operation failed"));
        assert!(msg.contains("connection refused"));
    }
}
