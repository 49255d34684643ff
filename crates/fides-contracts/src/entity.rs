//! Entity identity.
//!
//! FIDES scores *entities* — autonomous agents, workers, or any other actor
//! whose behavior produces signals. FIDES does not prescribe what an entity
//! is; the id is whatever stable name the hosting application uses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, human-readable identifier for the entity being scored.
///
/// Used as the key for trust records, in every emitted event, and in
/// persistence. Example: `EntityId("research-agent-7")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    /// Construct an entity id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
