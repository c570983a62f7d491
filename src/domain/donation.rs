//! Donation record type and status.

use serde::{Deserialize, Serialize};

use super::BloodGroup;
use crate::error::CoreError;
use crate::store::Record;

/// Lifecycle status of a donation record.
///
/// Anything outside the three canonical statuses deserializes as
/// [`DonationStatus::Unknown`] so a single bad record cannot poison a
/// listing or an aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonationStatus {
    /// Slot booked, donation not yet performed. Counts toward inventory.
    #[default]
    Scheduled,
    /// Donation performed. Counts toward inventory.
    Completed,
    /// Slot cancelled. Never counts toward inventory.
    Cancelled,
    /// Unrecognized stored value.
    #[serde(other)]
    Unknown,
}

impl DonationStatus {
    /// Returns the stored string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
        }
    }

    /// The statuses whose donations contribute to the live inventory.
    pub const IN_INVENTORY: [Self; 2] = [Self::Scheduled, Self::Completed];
}

/// A single donation record.
///
/// Immutable once written except for status transitions. `blood_group` is
/// kept as the stored string; use [`Donation::group`] to resolve it against
/// the canonical set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    /// Unique record id (UUID v4 string).
    #[serde(default)]
    pub id: String,
    /// Id of the donating user.
    #[serde(default)]
    pub donor_id: String,
    /// Donor display name captured at scheduling time.
    #[serde(default)]
    pub donor_name: String,
    /// Stored blood-group string.
    #[serde(default)]
    pub blood_group: String,
    /// Calendar-day string (`YYYY-MM-DD`) as written by the scheduler.
    #[serde(default)]
    pub date: String,
    /// Donation location.
    #[serde(default)]
    pub location: String,
    /// Booked time slot.
    #[serde(default)]
    pub time_slot: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: DonationStatus,
}

impl Donation {
    /// Parses a raw store record into a donation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedRecord`] if a field carries a value of
    /// the wrong JSON type. Missing fields fall back to defaults.
    pub fn from_record(record: &Record) -> Result<Self, CoreError> {
        serde_json::from_value(serde_json::Value::Object(record.clone()))
            .map_err(|e| CoreError::MalformedRecord(format!("donation: {e}")))
    }

    /// Resolves the stored blood-group string against the canonical set.
    #[must_use]
    pub fn group(&self) -> Option<BloodGroup> {
        BloodGroup::parse(&self.blood_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn from_record_fills_defaults() {
        let rec = record(&[
            ("id", serde_json::json!("d-1")),
            ("blood_group", serde_json::json!("O+")),
        ]);
        let donation = Donation::from_record(&rec).ok();
        let Some(donation) = donation else {
            unreachable!("lenient parse failed");
        };
        assert_eq!(donation.id, "d-1");
        assert_eq!(donation.group(), Some(BloodGroup::OPos));
        assert_eq!(donation.status, DonationStatus::Scheduled);
        assert!(donation.location.is_empty());
    }

    #[test]
    fn unknown_status_degrades_instead_of_failing() {
        let rec = record(&[("status", serde_json::json!("Rescheduled"))]);
        let donation = Donation::from_record(&rec).ok();
        let Some(donation) = donation else {
            unreachable!("lenient parse failed");
        };
        assert_eq!(donation.status, DonationStatus::Unknown);
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let rec = record(&[("date", serde_json::json!(20260823))]);
        let result = Donation::from_record(&rec);
        assert!(matches!(result, Err(CoreError::MalformedRecord(_))));
    }

    #[test]
    fn malformed_blood_group_resolves_to_none() {
        let rec = record(&[("blood_group", serde_json::json!("X+"))]);
        let donation = Donation::from_record(&rec).ok();
        let Some(donation) = donation else {
            unreachable!("lenient parse failed");
        };
        assert_eq!(donation.group(), None);
    }
}
