//! Engine configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Table names default to the
//! `bloodbridge-*` development tables.

use crate::store::Collection;

/// Top-level engine configuration.
///
/// Loaded once at startup via [`CoreConfig::from_env`].
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Backing table for user records.
    pub users_table: String,

    /// Backing table for donation records.
    pub donations_table: String,

    /// Backing table for blood request records.
    pub blood_requests_table: String,

    /// Preferred page size for backends that let the client choose one.
    pub scan_page_size: usize,
}

impl CoreConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to development defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            users_table: parse_env_string("USERS_TABLE", "bloodbridge-users"),
            donations_table: parse_env_string("DONATIONS_TABLE", "bloodbridge-donations"),
            blood_requests_table: parse_env_string(
                "BLOOD_REQUESTS_TABLE",
                "bloodbridge-blood-requests",
            ),
            scan_page_size: parse_env("SCAN_PAGE_SIZE", 100),
        }
    }

    /// Returns the backing table name for a collection.
    #[must_use]
    pub fn table_name(&self, collection: Collection) -> &str {
        match collection {
            Collection::Users => &self.users_table,
            Collection::Donations => &self.donations_table,
            Collection::BloodRequests => &self.blood_requests_table,
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            users_table: "bloodbridge-users".to_string(),
            donations_table: "bloodbridge-donations".to_string(),
            blood_requests_table: "bloodbridge-blood-requests".to_string(),
            scan_page_size: 100,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Reads an environment variable as a trimmed string with a default.
fn parse_env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_collections() {
        let config = CoreConfig::default();
        assert_eq!(config.table_name(Collection::Users), "bloodbridge-users");
        assert_eq!(
            config.table_name(Collection::Donations),
            "bloodbridge-donations"
        );
        assert_eq!(
            config.table_name(Collection::BloodRequests),
            "bloodbridge-blood-requests"
        );
        assert_eq!(config.scan_page_size, 100);
    }
}
