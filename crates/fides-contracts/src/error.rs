//! Runtime error types for the FIDES trust engine.
//!
//! All fallible operations in the FIDES crates return `FidesResult<T>`.
//! There is no fatal error class inside the engine: every failure is local
//! and recoverable by the caller. In particular, a persistence failure never
//! rolls back the in-memory record it was persisting.

use thiserror::Error;

/// The unified error type for the FIDES runtime.
#[derive(Debug, Error)]
pub enum FidesError {
    /// A signal type string carried a component prefix the engine does not
    /// score. Raised at signal construction, not silently dropped at
    /// scoring time.
    #[error("unknown signal component prefix: '{prefix}'")]
    UnknownComponent { prefix: String },

    /// An operation that requires a storage provider was called on an
    /// engine constructed without one.
    #[error("persistence is not configured")]
    PersistenceNotConfigured,

    /// The injected storage provider failed. In-memory state remains
    /// authoritative; callers decide whether to retry.
    #[error("persistence operation failed: {reason}")]
    Persistence { reason: String },

    /// A configuration value is missing or malformed.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Convenience alias used throughout the FIDES crates.
pub type FidesResult<T> = Result<T, FidesError>;
