//! Engine configuration.
//!
//! All knobs govern decay and failure clustering; the scoring weights,
//! recency half-lives, and collection caps are fixed constants of the
//! model and are not configurable.
//!
//! A config can be built in code (`EngineConfig::default()` plus struct
//! update syntax) or loaded from TOML:
//!
//! ```toml
//! decay_rate = 0.02
//! decay_interval_ms = 30000
//! failure_threshold = 0.25
//! ```

use std::path::Path;

use chrono::Duration;
use serde::Deserialize;

use fides_contracts::error::{FidesError, FidesResult};

/// Tunable parameters of the trust engine.
///
/// Every field has a default; TOML files may specify any subset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Fraction of the score lost per decay interval (before multipliers).
    pub decay_rate: f64,

    /// Length of one decay interval in milliseconds. Reads within one
    /// interval of the watermark apply no decay.
    pub decay_interval_ms: u64,

    /// Signals with `value` strictly below this count as failures.
    pub failure_threshold: f64,

    /// Decay-rate multiplier applied while accelerated decay is active.
    pub accelerated_decay_multiplier: f64,

    /// Rolling window, in milliseconds, over which failures cluster.
    pub failure_window_ms: u64,

    /// Failures inside the window required to activate accelerated decay.
    pub min_failures_for_acceleration: usize,

    /// Whether committed mutations are written through to the store.
    /// `None` resolves to true exactly when a store is injected.
    pub auto_persist: Option<bool>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decay_rate: 0.01,
            decay_interval_ms: 60_000,
            failure_threshold: 0.3,
            accelerated_decay_multiplier: 3.0,
            failure_window_ms: 3_600_000,
            min_failures_for_acceleration: 2,
            auto_persist: None,
        }
    }
}

impl EngineConfig {
    /// Parse `s` as a TOML engine configuration.
    ///
    /// Returns `FidesError::Config` if the TOML is malformed or contains
    /// unknown keys.
    pub fn from_toml_str(s: &str) -> FidesResult<Self> {
        toml::from_str(s).map_err(|e| FidesError::Config {
            reason: format!("failed to parse engine config TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> FidesResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| FidesError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The decay interval as a chrono `Duration`.
    pub fn decay_interval(&self) -> Duration {
        Duration::milliseconds(self.decay_interval_ms as i64)
    }

    /// The failure window as a chrono `Duration`.
    pub fn failure_window(&self) -> Duration {
        Duration::milliseconds(self.failure_window_ms as i64)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::EngineConfig;
    use fides_contracts::error::FidesError;

    #[test]
    fn defaults_match_model_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.decay_rate, 0.01);
        assert_eq!(config.decay_interval_ms, 60_000);
        assert_eq!(config.failure_threshold, 0.3);
        assert_eq!(config.accelerated_decay_multiplier, 3.0);
        assert_eq!(config.failure_window_ms, 3_600_000);
        assert_eq!(config.min_failures_for_acceleration, 2);
        assert!(config.auto_persist.is_none());
    }

    #[test]
    fn toml_overrides_subset_of_fields() {
        let config = EngineConfig::from_toml_str(
            r#"
            decay_rate = 0.05
            min_failures_for_acceleration = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.decay_rate, 0.05);
        assert_eq!(config.min_failures_for_acceleration, 3);
        // Untouched fields keep their defaults.
        assert_eq!(config.decay_interval_ms, 60_000);
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        let err = EngineConfig::from_toml_str("decay_rat = 0.05").unwrap_err();
        match err {
            FidesError::Config { reason } => assert!(reason.contains("decay_rat")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn durations_convert_to_chrono() {
        let config = EngineConfig::default();
        assert_eq!(config.decay_interval().num_seconds(), 60);
        assert_eq!(config.failure_window().num_hours(), 1);
    }
}
