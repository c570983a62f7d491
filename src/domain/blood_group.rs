//! Canonical blood-group type.
//!
//! [`BloodGroup`] is a closed enum over the 8 ABO/Rh combinations the
//! system tracks. The canonical order of [`BloodGroup::ALL`] is the order
//! every serialized inventory sequence uses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the 8 canonical ABO/Rh blood groups.
///
/// Serializes as the display string (`"A+"`, `"O-"`, ...). Stored records
/// may carry arbitrary strings in their `blood_group` field; use
/// [`BloodGroup::parse`] to resolve them — unknown strings resolve to
/// `None`, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    /// A positive.
    #[serde(rename = "A+")]
    APos,
    /// A negative.
    #[serde(rename = "A-")]
    ANeg,
    /// B positive.
    #[serde(rename = "B+")]
    BPos,
    /// B negative.
    #[serde(rename = "B-")]
    BNeg,
    /// AB positive.
    #[serde(rename = "AB+")]
    AbPos,
    /// AB negative.
    #[serde(rename = "AB-")]
    AbNeg,
    /// O positive.
    #[serde(rename = "O+")]
    OPos,
    /// O negative.
    #[serde(rename = "O-")]
    ONeg,
}

impl BloodGroup {
    /// All 8 canonical groups, in canonical serialization order.
    pub const ALL: [Self; 8] = [
        Self::APos,
        Self::ANeg,
        Self::BPos,
        Self::BNeg,
        Self::AbPos,
        Self::AbNeg,
        Self::OPos,
        Self::ONeg,
    ];

    /// Returns the display label for this group.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::APos => "A+",
            Self::ANeg => "A-",
            Self::BPos => "B+",
            Self::BNeg => "B-",
            Self::AbPos => "AB+",
            Self::AbNeg => "AB-",
            Self::OPos => "O+",
            Self::ONeg => "O-",
        }
    }

    /// Resolves a stored blood-group string to a canonical group.
    ///
    /// Returns `None` for anything outside the canonical set (including
    /// empty strings); callers treat that as "no units available".
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.label() == value)
    }

    /// Position of this group in the canonical order.
    #[must_use]
    pub fn canonical_index(&self) -> usize {
        Self::ALL.iter().position(|g| g == self).unwrap_or(0)
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
