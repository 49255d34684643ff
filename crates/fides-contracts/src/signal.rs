//! Behavioral signals and their component routing.
//!
//! A signal is one timestamped observation about an entity, scoped to one of
//! four scoring components. The wire form is a dotted string
//! (`"behavioral.task_success"`); internally the component is resolved at
//! construction time so a typo in the prefix is an error the caller sees,
//! not a signal that silently routes nowhere.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{entity::EntityId, error::FidesError};

/// The four scoring components. Weights are fixed and sum to exactly 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Task outcomes, quality of work, interaction behavior. Weight 0.40.
    Behavioral,
    /// Adherence to policy and operating constraints. Weight 0.25.
    Compliance,
    /// Strength of identity attestation. Weight 0.20.
    Identity,
    /// Fit between the entity and its operating context. Weight 0.15.
    Context,
}

impl Component {
    /// All components, in weight order.
    pub const ALL: [Component; 4] = [
        Component::Behavioral,
        Component::Compliance,
        Component::Identity,
        Component::Context,
    ];

    /// The fixed scoring weight for this component.
    pub fn weight(self) -> f64 {
        match self {
            Component::Behavioral => 0.40,
            Component::Compliance => 0.25,
            Component::Identity => 0.20,
            Component::Context => 0.15,
        }
    }

    /// The dotted-string prefix that routes to this component.
    pub fn prefix(self) -> &'static str {
        match self {
            Component::Behavioral => "behavioral",
            Component::Compliance => "compliance",
            Component::Identity => "identity",
            Component::Context => "context",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// The parsed form of a dotted signal type like `"behavioral.task_success"`.
///
/// The component is decided once, at construction. An unrecognized prefix is
/// a `FidesError::UnknownComponent` from `FromStr`, never a scoring no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalKind {
    /// Which scoring component this signal feeds.
    pub component: Component,
    /// Free-form discriminant after the dot (e.g. "task_success", "error").
    pub subtype: String,
}

impl SignalKind {
    /// Construct a kind directly from its parts.
    pub fn new(component: Component, subtype: impl Into<String>) -> Self {
        Self {
            component,
            subtype: subtype.into(),
        }
    }
}

impl FromStr for SignalKind {
    type Err = FidesError;

    /// Parse the dotted wire form.
    ///
    /// The prefix before the first `.` selects the component; everything
    /// after it is the subtype. A missing dot yields an empty subtype.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, subtype) = match s.split_once('.') {
            Some((p, rest)) => (p, rest),
            None => (s, ""),
        };

        let component = Component::ALL
            .into_iter()
            .find(|c| c.prefix() == prefix)
            .ok_or_else(|| FidesError::UnknownComponent {
                prefix: prefix.to_string(),
            })?;

        Ok(Self {
            component,
            subtype: subtype.to_string(),
        })
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.subtype)
    }
}

/// One immutable behavioral observation about an entity.
///
/// `value` expresses how positive the observation is on [0, 1]; values below
/// the engine's failure threshold count toward failure clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustSignal {
    /// The entity this observation is about.
    pub entity_id: EntityId,
    /// Component routing plus free-form subtype.
    pub kind: SignalKind,
    /// Observation strength in [0, 1]. Clamped at construction.
    pub value: f64,
    /// When the observation was made (UTC).
    pub timestamp: DateTime<Utc>,
}

impl TrustSignal {
    /// Build a signal, clamping `value` into [0, 1].
    pub fn new(
        entity_id: EntityId,
        kind: SignalKind,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id,
            kind,
            value: value.clamp(0.0, 1.0),
            timestamp,
        }
    }
}
