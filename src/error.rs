//! Core error types with numeric error-code mapping.
//!
//! [`CoreError`] is the central error type for the engine. Each variant
//! maps to a numeric code that presentation collaborators can translate
//! into their own transport-level responses.

/// Engine error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category                   |
/// |-----------|----------------------------|
/// | 1000–1999 | Malformed stored data      |
/// | 2000–2999 | Missing referenced records |
/// | 3000–3999 | Store/backend failures     |
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The backing store failed mid-operation (lookup or pagination).
    ///
    /// The Record Store Adapter raises this instead of ever returning a
    /// truncated result set as if it were complete.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A referenced record (user, request) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A stored record violates the expected shape.
    ///
    /// Listing and aggregation paths generally degrade to a safe default
    /// instead of propagating this; it surfaces only where a single record
    /// is the whole operation.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

impl CoreError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedRecord(_) => 1001,
            Self::NotFound(_) => 2001,
            Self::StoreUnavailable(_) => 3001,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            CoreError::MalformedRecord("units".to_string()).error_code(),
            1001
        );
        assert_eq!(CoreError::NotFound("user".to_string()).error_code(), 2001);
        assert_eq!(
            CoreError::StoreUnavailable("timeout".to_string()).error_code(),
            3001
        );
    }

    #[test]
    fn display_includes_context() {
        let err = CoreError::StoreUnavailable("page 3 failed".to_string());
        assert_eq!(err.to_string(), "store unavailable: page 3 failed");
    }
}
