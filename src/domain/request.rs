//! Blood request record type, status, and availability annotation.

use serde::{Deserialize, Serialize};

use super::BloodGroup;
use crate::error::CoreError;
use crate::store::Record;

/// Lifecycle status of a blood request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting fulfillment. Indexed for fast "open requests" queries.
    #[default]
    Pending,
    /// Request has been fulfilled.
    Fulfilled,
    /// Request was cancelled by the requester.
    Cancelled,
    /// Unrecognized stored value.
    #[serde(other)]
    Unknown,
}

impl RequestStatus {
    /// Returns the stored string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

/// A stored blood request.
///
/// `units` is kept as the raw JSON value the writer stored; historical
/// records hold numbers, strings, or nothing at all. Use
/// [`BloodRequest::requested_units`] for the lenient integer reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodRequest {
    /// Unique record id (UUID v4 string).
    #[serde(default)]
    pub id: String,
    /// Id of the requesting user.
    #[serde(default)]
    pub requester_id: String,
    /// Patient the blood is for.
    #[serde(default)]
    pub patient_name: String,
    /// Stored blood-group string.
    #[serde(default)]
    pub blood_group: String,
    /// Requested unit count as stored (number, string, or absent).
    #[serde(default)]
    pub units: serde_json::Value,
    /// Destination hospital.
    #[serde(default)]
    pub hospital: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: RequestStatus,
    /// Creation instant (RFC 3339); also the sort key of the
    /// requester and status secondary indexes.
    #[serde(default)]
    pub timestamp: String,
}

impl BloodRequest {
    /// Parses a raw store record into a blood request.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedRecord`] if a field carries a value of
    /// the wrong JSON type. Missing fields fall back to defaults.
    pub fn from_record(record: &Record) -> Result<Self, CoreError> {
        serde_json::from_value(serde_json::Value::Object(record.clone()))
            .map_err(|e| CoreError::MalformedRecord(format!("blood request: {e}")))
    }

    /// Resolves the stored blood-group string against the canonical set.
    #[must_use]
    pub fn group(&self) -> Option<BloodGroup> {
        BloodGroup::parse(&self.blood_group)
    }

    /// Lenient integer reading of `units`.
    ///
    /// Non-numeric, missing, and non-positive values all read as 0, which
    /// downstream availability logic treats as "never available".
    #[must_use]
    pub fn requested_units(&self) -> u64 {
        let parsed = match &self.units {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n > 0 => {
                #[allow(clippy::cast_sign_loss)]
                let n = n as u64;
                n
            }
            _ => 0,
        }
    }
}

/// A blood request annotated with availability against an inventory
/// snapshot. Computed for display only, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedRequest {
    /// The stored request, serialized inline.
    #[serde(flatten)]
    pub request: BloodRequest,
    /// Units currently available for the request's blood group.
    pub available_units: u64,
    /// Whether the inventory can cover the requested units.
    pub is_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_units(units: serde_json::Value) -> BloodRequest {
        BloodRequest {
            id: "r-1".to_string(),
            requester_id: "u-1".to_string(),
            patient_name: "Pat".to_string(),
            blood_group: "O+".to_string(),
            units,
            hospital: "General".to_string(),
            status: RequestStatus::Pending,
            timestamp: "2026-08-23T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn numeric_units_parse() {
        assert_eq!(request_with_units(serde_json::json!(3)).requested_units(), 3);
    }

    #[test]
    fn string_units_parse() {
        assert_eq!(
            request_with_units(serde_json::json!("2")).requested_units(),
            2
        );
    }

    #[test]
    fn garbage_units_read_as_zero() {
        assert_eq!(
            request_with_units(serde_json::json!("lots")).requested_units(),
            0
        );
        assert_eq!(
            request_with_units(serde_json::Value::Null).requested_units(),
            0
        );
        assert_eq!(
            request_with_units(serde_json::json!(-4)).requested_units(),
            0
        );
        assert_eq!(request_with_units(serde_json::json!(0)).requested_units(), 0);
    }

    #[test]
    fn status_deserializes_lowercase_with_catch_all() {
        let pending: Option<RequestStatus> = serde_json::from_str("\"pending\"").ok();
        assert_eq!(pending, Some(RequestStatus::Pending));
        let odd: Option<RequestStatus> = serde_json::from_str("\"escalated\"").ok();
        assert_eq!(odd, Some(RequestStatus::Unknown));
    }

    #[test]
    fn annotation_serializes_flattened() {
        let annotated = AnnotatedRequest {
            request: request_with_units(serde_json::json!(2)),
            available_units: 5,
            is_available: true,
        };
        let value = serde_json::to_value(&annotated).ok();
        let Some(value) = value else {
            unreachable!("serialization failed");
        };
        assert_eq!(value.get("id"), Some(&serde_json::json!("r-1")));
        assert_eq!(value.get("available_units"), Some(&serde_json::json!(5)));
        assert_eq!(value.get("is_available"), Some(&serde_json::json!(true)));
    }
}
