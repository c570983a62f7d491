//! User record type.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::store::Record;

/// A stored user.
///
/// `role` and `current_role` stay as free strings — the store may hold
/// roles this engine does not interpret, and the Dashboard Assembler only
/// needs equality checks on the known ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    /// Unique record id (UUID v4 string).
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login email (stored lowercased).
    #[serde(default)]
    pub email: String,
    /// Account role (`donor`, `recipient`, `bloodbank`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Currently selected role for dual-role accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_role: Option<String>,
    /// Blood group, possibly absent until back-filled from donations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
}

impl User {
    /// Parses a raw store record into a user.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedRecord`] if a field carries a value of
    /// the wrong JSON type. Missing fields fall back to defaults.
    pub fn from_record(record: &Record) -> Result<Self, CoreError> {
        serde_json::from_value(serde_json::Value::Object(record.clone()))
            .map_err(|e| CoreError::MalformedRecord(format!("user: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_record_keeps_role_fields_separate() {
        let record: Record = [
            ("id".to_string(), serde_json::json!("u-1")),
            ("role".to_string(), serde_json::json!("donor")),
            ("current_role".to_string(), serde_json::json!("recipient")),
        ]
        .into_iter()
        .collect();
        let user = User::from_record(&record).ok();
        let Some(user) = user else {
            unreachable!("lenient parse failed");
        };
        assert_eq!(user.role.as_deref(), Some("donor"));
        assert_eq!(user.current_role.as_deref(), Some("recipient"));
    }

    #[test]
    fn absent_optionals_are_skipped_in_output() {
        let user = User {
            id: "u-1".to_string(),
            ..User::default()
        };
        let value = serde_json::to_value(&user).ok();
        let Some(value) = value else {
            unreachable!("serialization failed");
        };
        assert!(value.get("blood_group").is_none());
    }
}
