//! Aggregation Engine: exact client-side counts over the store.
//!
//! The backing store offers no server-side aggregates, so every count here
//! drives the [`StoreAdapter`] to exhaustion and reduces client-side. All
//! counts enumerate every matching record — exactness over scalability, an
//! explicit trade-off for the data volumes this system targets. Anything
//! that wants cheaper counts later swaps the implementation behind this
//! type without touching the inventory or availability layers.

use std::collections::{HashMap, HashSet};

use crate::error::CoreError;
use crate::store::{Collection, FilterExpr, QuerySpec, ScanSpec, SecondaryIndex, StoreAdapter};

/// Scalar and grouped count computations.
#[derive(Debug, Clone)]
pub struct Aggregator {
    store: StoreAdapter,
}

impl Aggregator {
    /// Creates an aggregator over the given adapter.
    #[must_use]
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    /// Counts distinct non-empty values of `field` across a collection.
    ///
    /// Scans with a projection limited to `field` so full records are never
    /// transferred. Missing and empty values are excluded — they do not
    /// form a distinct "null" bucket.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn count_distinct(
        &self,
        collection: Collection,
        field: &str,
    ) -> Result<usize, CoreError> {
        let spec = ScanSpec::all()
            .with_projection([field])
            .with_filter(FilterExpr::exists(field));
        let records = self.store.scan_all(collection, &spec).await?;
        let distinct: HashSet<&str> = records
            .iter()
            .filter_map(|r| r.get(field).and_then(serde_json::Value::as_str))
            .filter(|v| !v.is_empty())
            .collect();
        Ok(distinct.len())
    }

    /// Counts records with the given status.
    ///
    /// Prefers the status-ordered secondary index; when the index query is
    /// unavailable it falls back to a full scan with an equality filter.
    /// Either path yields an exact count.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the fallback scan also
    /// fails.
    pub async fn count_by_status(
        &self,
        collection: Collection,
        status: &str,
    ) -> Result<usize, CoreError> {
        let spec = QuerySpec {
            index: SecondaryIndex::StatusTimestamp,
            key: status.to_string(),
            descending: false,
            limit: None,
        };
        match self.store.query_all(collection, &spec).await {
            Ok(records) => Ok(records.len()),
            Err(CoreError::StoreUnavailable(err)) => {
                tracing::warn!(
                    %err,
                    collection = collection.name(),
                    status,
                    "status index unavailable; counting via full scan"
                );
                let spec = ScanSpec::all()
                    .with_projection(["id"])
                    .with_filter(FilterExpr::eq("status", status));
                let records = self.store.scan_all(collection, &spec).await?;
                Ok(records.len())
            }
            Err(other) => Err(other),
        }
    }

    /// Counts records whose `date` field equals `date` exactly.
    ///
    /// Plain string comparison on the writer's calendar-day string — no
    /// range semantics, no timezone normalization.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn count_by_date(
        &self,
        collection: Collection,
        date: &str,
    ) -> Result<usize, CoreError> {
        let spec = ScanSpec::all()
            .with_projection(["id"])
            .with_filter(FilterExpr::eq("date", date));
        let records = self.store.scan_all(collection, &spec).await?;
        Ok(records.len())
    }

    /// Counts records bucketed by `group_field`, restricted to records
    /// whose `status_field` is in `status_values`.
    ///
    /// Every value in `group_values` is present in the result, zero
    /// included — absent buckets are never omitted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn count_grouped(
        &self,
        collection: Collection,
        group_field: &str,
        group_values: &[&str],
        status_field: &str,
        status_values: &[&str],
    ) -> Result<HashMap<String, u64>, CoreError> {
        let mut counts: HashMap<String, u64> = group_values
            .iter()
            .map(|v| ((*v).to_string(), 0))
            .collect();

        let filter = FilterExpr::All(vec![
            FilterExpr::any_of(group_field, group_values.iter().copied()),
            FilterExpr::any_of(status_field, status_values.iter().copied()),
        ]);
        let spec = ScanSpec::all()
            .with_projection([group_field])
            .with_filter(filter);
        let records = self.store.scan_all(collection, &spec).await?;

        for record in &records {
            if let Some(bucket) = record
                .get(group_field)
                .and_then(serde_json::Value::as_str)
                .and_then(|v| counts.get_mut(v))
            {
                *bucket += 1;
            }
        }
        Ok(counts)
    }
}
