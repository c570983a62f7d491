//! Record Store Adapter: pagination-exhaustive access to the three
//! record collections.
//!
//! The backing store is an external collaborator that serves results one
//! page at a time behind opaque continuation tokens and offers no joins or
//! server-side aggregates. [`PageSource`] is the page-level contract a
//! backend implements; [`StoreAdapter`] drives it to exhaustion so callers
//! never see a partial result. If the backend fails mid-pagination the
//! whole operation fails with [`CoreError::StoreUnavailable`] — a
//! truncated prefix is never returned as if it were complete.

pub mod memory;
pub mod repository;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreError;

/// A raw stored record: a flat JSON object, the backend's item shape
/// after numeric normalization.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The three record collections this engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// User accounts.
    Users,
    /// Donation records.
    Donations,
    /// Blood request records.
    BloodRequests,
}

impl Collection {
    /// Logical collection name, used in log context and error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Donations => "donations",
            Self::BloodRequests => "blood_requests",
        }
    }
}

/// Secondary indexes the backing collections maintain (provisioned by the
/// table-setup collaborator; this engine only queries them).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryIndex {
    /// Donations by `donor_id`, sorted by `date`.
    DonorDate,
    /// Blood requests by `requester_id`, sorted by `timestamp`.
    RequesterTimestamp,
    /// Blood requests by `status`, sorted by `timestamp`.
    StatusTimestamp,
}

impl SecondaryIndex {
    /// The equality-key field of this index.
    #[must_use]
    pub const fn key_field(&self) -> &'static str {
        match self {
            Self::DonorDate => "donor_id",
            Self::RequesterTimestamp => "requester_id",
            Self::StatusTimestamp => "status",
        }
    }

    /// The sort-key field of this index. Values are compared as strings.
    #[must_use]
    pub const fn sort_field(&self) -> &'static str {
        match self {
            Self::DonorDate => "date",
            Self::RequesterTimestamp | Self::StatusTimestamp => "timestamp",
        }
    }
}

/// Record predicate evaluated backend-side where possible, or client-side
/// by the in-memory backend. Exactly the three predicate styles the
/// aggregation paths need, plus conjunction.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Exact equality on a field.
    Eq {
        /// Field name.
        field: String,
        /// Expected value.
        value: serde_json::Value,
    },
    /// Membership of a string field in a value set.
    AnyOf {
        /// Field name.
        field: String,
        /// Accepted values.
        values: Vec<String>,
    },
    /// Field is present and non-empty.
    Exists {
        /// Field name.
        field: String,
    },
    /// Conjunction of sub-filters.
    All(Vec<FilterExpr>),
}

impl FilterExpr {
    /// Equality filter.
    #[must_use]
    pub fn eq(field: &str, value: impl Into<serde_json::Value>) -> Self {
        Self::Eq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Membership filter.
    #[must_use]
    pub fn any_of<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyOf {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Presence filter, used for projection-only scans.
    #[must_use]
    pub fn exists(field: &str) -> Self {
        Self::Exists {
            field: field.to_string(),
        }
    }

    /// Evaluates this filter against a record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Eq { field, value } => record.get(field) == Some(value),
            Self::AnyOf { field, values } => record
                .get(field)
                .and_then(serde_json::Value::as_str)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
            Self::Exists { field } => match record.get(field) {
                None | Some(serde_json::Value::Null) => false,
                Some(serde_json::Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            },
            Self::All(filters) => filters.iter().all(|f| f.matches(record)),
        }
    }
}

/// Full-collection scan parameters.
#[derive(Debug, Clone, Default)]
pub struct ScanSpec {
    /// When set, returned records carry only these fields. Used by the
    /// distinct-count paths to avoid transferring full records.
    pub projection: Option<Vec<String>>,
    /// Optional record predicate.
    pub filter: Option<FilterExpr>,
}

impl ScanSpec {
    /// Scan everything, full records.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds a filter to this spec.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Limits returned fields to the given projection.
    #[must_use]
    pub fn with_projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Secondary-index query parameters.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    /// Index to query.
    pub index: SecondaryIndex,
    /// Equality value for the index key field.
    pub key: String,
    /// Return results sorted descending by the index sort field.
    pub descending: bool,
    /// Stop paginating once this many records are collected.
    pub limit: Option<usize>,
}

impl QuerySpec {
    /// Query all matches for `key`, most recent first.
    #[must_use]
    pub fn descending(index: SecondaryIndex, key: &str) -> Self {
        Self {
            index,
            key: key.to_string(),
            descending: true,
            limit: None,
        }
    }

    /// Caps the logical result set at `limit` records.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Opaque continuation token returned by a backend when more results
/// remain. Callers never inspect it, only hand it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken(String);

impl PageToken {
    /// Wraps a backend-specific token string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token string, for the issuing backend only.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of results from a backend.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Records in this page.
    pub items: Vec<Record>,
    /// Continuation token when more results remain.
    pub next: Option<PageToken>,
}

/// Page-level contract a storage backend implements.
///
/// Implementations return one page per call and must issue a
/// continuation token whenever the logical result set extends past the
/// returned page. They must fail with [`CoreError::StoreUnavailable`] on
/// transport problems rather than returning a short page silently.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns one page of a full-collection scan.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    async fn scan_page(
        &self,
        collection: Collection,
        spec: &ScanSpec,
        start: Option<&PageToken>,
    ) -> Result<Page, CoreError>;

    /// Returns one page of a secondary-index query.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    async fn query_page(
        &self,
        collection: Collection,
        spec: &QuerySpec,
        start: Option<&PageToken>,
    ) -> Result<Page, CoreError>;

    /// Fetches a single record by primary id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    async fn get_item(&self, collection: Collection, id: &str)
    -> Result<Option<Record>, CoreError>;

    /// Writes a record (insert or full replace by id).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    async fn put_item(&self, collection: Collection, record: Record) -> Result<(), CoreError>;

    /// Sets a single field on an existing record. Idempotent: setting a
    /// field to the value it already holds is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure or
    /// [`CoreError::NotFound`] if the record does not exist.
    async fn update_field(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: serde_json::Value,
    ) -> Result<(), CoreError>;

    /// Deletes a record by primary id. Deleting an absent record is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    async fn delete_item(&self, collection: Collection, id: &str) -> Result<(), CoreError>;
}

/// Exhaustive-pagination front over any [`PageSource`].
///
/// All read methods return the complete logical result set; continuation
/// tokens never escape this type.
#[derive(Clone)]
pub struct StoreAdapter {
    source: Arc<dyn PageSource>,
}

impl fmt::Debug for StoreAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreAdapter").finish_non_exhaustive()
    }
}

impl StoreAdapter {
    /// Wraps a backend.
    #[must_use]
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }

    /// Scans a collection to exhaustion.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if any page fails; no
    /// partial prefix is ever returned.
    pub async fn scan_all(
        &self,
        collection: Collection,
        spec: &ScanSpec,
    ) -> Result<Vec<Record>, CoreError> {
        let mut items = Vec::new();
        let mut token: Option<PageToken> = None;
        loop {
            let page = self
                .source
                .scan_page(collection, spec, token.as_ref())
                .await?;
            items.extend(page.items);
            match page.next {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(items)
    }

    /// Runs a secondary-index query to exhaustion, or until the spec's
    /// limit is satisfied. The result is truncated to exactly `limit`
    /// records when one is set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if any page fails; no
    /// partial prefix is ever returned.
    pub async fn query_all(
        &self,
        collection: Collection,
        spec: &QuerySpec,
    ) -> Result<Vec<Record>, CoreError> {
        let mut items: Vec<Record> = Vec::new();
        let mut token: Option<PageToken> = None;
        loop {
            let page = self
                .source
                .query_page(collection, spec, token.as_ref())
                .await?;
            items.extend(page.items);
            if let Some(limit) = spec.limit
                && items.len() >= limit
            {
                items.truncate(limit);
                break;
            }
            match page.next {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(items)
    }

    /// Fetches a single record by primary id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn get_item(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Record>, CoreError> {
        self.source.get_item(collection, id).await
    }

    /// Writes a record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn put_item(&self, collection: Collection, record: Record) -> Result<(), CoreError> {
        self.source.put_item(collection, record).await
    }

    /// Sets a single field on an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure or
    /// [`CoreError::NotFound`] if the record does not exist.
    pub async fn update_field(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: serde_json::Value,
    ) -> Result<(), CoreError> {
        self.source.update_field(collection, id, field, value).await
    }

    /// Deletes a record by primary id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn delete_item(&self, collection: Collection, id: &str) -> Result<(), CoreError> {
        self.source.delete_item(collection, id).await
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
    fn eq_filter_matches_exact_value() {
        let filter = FilterExpr::eq("date", "2026-08-23");
        assert!(filter.matches(&record(&[("date", serde_json::json!("2026-08-23"))])));
        assert!(!filter.matches(&record(&[("date", serde_json::json!("2026-08-22"))])));
        assert!(!filter.matches(&record(&[])));
    }

    #[test]
    fn any_of_filter_checks_membership() {
        let filter = FilterExpr::any_of("status", ["Scheduled", "Completed"]);
        assert!(filter.matches(&record(&[("status", serde_json::json!("Completed"))])));
        assert!(!filter.matches(&record(&[("status", serde_json::json!("Cancelled"))])));
    }

    #[test]
    fn exists_filter_excludes_empty_and_null() {
        let filter = FilterExpr::exists("donor_id");
        assert!(filter.matches(&record(&[("donor_id", serde_json::json!("u-1"))])));
        assert!(!filter.matches(&record(&[("donor_id", serde_json::json!(""))])));
        assert!(!filter.matches(&record(&[("donor_id", serde_json::Value::Null)])));
        assert!(!filter.matches(&record(&[])));
    }

    #[test]
    fn all_filter_is_conjunction() {
        let filter = FilterExpr::All(vec![
            FilterExpr::any_of("blood_group", ["O+"]),
            FilterExpr::any_of("status", ["Scheduled"]),
        ]);
        assert!(filter.matches(&record(&[
            ("blood_group", serde_json::json!("O+")),
            ("status", serde_json::json!("Scheduled")),
        ])));
        assert!(!filter.matches(&record(&[
            ("blood_group", serde_json::json!("O+")),
            ("status", serde_json::json!("Cancelled")),
        ])));
    }
}
