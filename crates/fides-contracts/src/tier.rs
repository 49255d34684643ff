//! The authority tier table.
//!
//! Six fixed, contiguous score bands over [0, 1000] map to ordered authority
//! tiers. The tier is always re-derived from the score — it is never stored
//! or advanced independently, so it cannot drift.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of six ordered authority bands, derived from the trust score.
///
/// | tier | band     |
/// |------|----------|
/// | `Sandbox`     | 0–99     |
/// | `Provisional` | 100–299  |
/// | `Standard`    | 300–499  |
/// | `Trusted`     | 500–699  |
/// | `Certified`   | 700–899  |
/// | `Autonomous`  | 900–1000 |
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TrustTier {
    Sandbox = 0,
    Provisional = 1,
    Standard = 2,
    Trusted = 3,
    Certified = 4,
    Autonomous = 5,
}

impl TrustTier {
    /// All tiers in ascending order.
    pub const ALL: [TrustTier; 6] = [
        TrustTier::Sandbox,
        TrustTier::Provisional,
        TrustTier::Standard,
        TrustTier::Trusted,
        TrustTier::Certified,
        TrustTier::Autonomous,
    ];

    /// The inclusive score band for this tier.
    pub fn band(self) -> (u16, u16) {
        match self {
            TrustTier::Sandbox => (0, 99),
            TrustTier::Provisional => (100, 299),
            TrustTier::Standard => (300, 499),
            TrustTier::Trusted => (500, 699),
            TrustTier::Certified => (700, 899),
            TrustTier::Autonomous => (900, 1000),
        }
    }

    /// Map a score to its tier.
    ///
    /// Scores above 1000 cannot occur after clamping; the fallback to
    /// `Sandbox` exists so an out-of-range value degrades to the least
    /// privileged tier instead of panicking.
    pub fn from_score(score: u16) -> Self {
        Self::ALL
            .into_iter()
            .find(|tier| {
                let (min, max) = tier.band();
                score >= min && score <= max
            })
            .unwrap_or(TrustTier::Sandbox)
    }

    /// The minimum score of this tier's band.
    pub fn floor(self) -> u16 {
        self.band().0
    }

    /// Human-readable tier name.
    pub fn name(self) -> &'static str {
        match self {
            TrustTier::Sandbox => "Sandbox",
            TrustTier::Provisional => "Provisional",
            TrustTier::Standard => "Standard",
            TrustTier::Trusted => "Trusted",
            TrustTier::Certified => "Certified",
            TrustTier::Autonomous => "Autonomous",
        }
    }

    /// Numeric level, 0 (Sandbox) through 5 (Autonomous).
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for TrustTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
