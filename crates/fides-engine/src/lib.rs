//! # fides-engine
//!
//! The FIDES behavioral trust engine.
//!
//! This crate provides:
//! - `TrustEngine` — owns every trust record, scores signals with recency
//!   weighting, applies lazy time decay on read, detects tier transitions,
//!   and emits domain events
//! - `TrustStore` — the injected persistence contract
//! - `EngineConfig` — decay and failure-clustering knobs with TOML loading
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fides_engine::{EngineConfig, TrustEngine};
//!
//! let engine = TrustEngine::new(EngineConfig::default());
//! engine.record_signal(signal)?;
//! let record = engine.get_score(&entity_id)?;
//! ```

pub mod config;
pub mod engine;
pub mod score;
pub mod traits;

pub use config::EngineConfig;
pub use engine::{Clock, TrustEngine};
pub use score::{ComplexityStats, TrustCalculation};
pub use traits::TrustStore;
