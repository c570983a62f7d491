//! In-memory store backend.
//!
//! Reference [`PageSource`] implementation used by the test suite and for
//! local development. It paginates with real continuation tokens so the
//! exhaustive-pagination loops in [`super::StoreAdapter`] are exercised
//! exactly as they would be against a remote backend, and it can inject
//! failures to test the loud-failure and index-fallback paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Collection, CoreError, Page, PageSource, PageToken, QuerySpec, Record, ScanSpec};
use crate::config::CoreConfig;

/// Sentinel for "never fail" in the scan failure budget.
const NO_FAILURE: i64 = -1;

/// In-memory backend with configurable page size and failure injection.
///
/// Records live in per-collection vectors in insertion order. Secondary
/// index queries are emulated by key-equality filtering plus a sort on the
/// index sort field (string comparison, id tie-break).
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Record>>>,
    page_size: usize,
    fail_queries: AtomicBool,
    scan_pages_until_failure: AtomicI64,
}

impl MemoryStore {
    /// Creates an empty store serving `page_size` records per page.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            page_size: page_size.max(1),
            fail_queries: AtomicBool::new(false),
            scan_pages_until_failure: AtomicI64::new(NO_FAILURE),
        }
    }

    /// Creates an empty store paging at the configured `scan_page_size`.
    #[must_use]
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.scan_page_size)
    }

    /// Inserts a record given as a JSON object. Non-object values are
    /// ignored; tests build records with `serde_json::json!`.
    pub async fn insert(&self, collection: Collection, value: serde_json::Value) {
        if let serde_json::Value::Object(record) = value {
            let mut map = self.collections.write().await;
            map.entry(collection).or_default().push(record);
        }
    }

    /// Makes every subsequent index query fail with `StoreUnavailable`.
    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Allows `pages` more scan pages to succeed, then fails every scan
    /// page with `StoreUnavailable` until reset via [`Self::heal_scans`].
    pub fn fail_scans_after(&self, pages: i64) {
        self.scan_pages_until_failure
            .store(pages.max(0), Ordering::SeqCst);
    }

    /// Clears any scan failure injection.
    pub fn heal_scans(&self) {
        self.scan_pages_until_failure
            .store(NO_FAILURE, Ordering::SeqCst);
    }

    /// Consumes one unit of the scan failure budget; `Err` when exhausted.
    fn charge_scan_page(&self) -> Result<(), CoreError> {
        let budget = self.scan_pages_until_failure.load(Ordering::SeqCst);
        if budget == NO_FAILURE {
            return Ok(());
        }
        if budget == 0 {
            return Err(CoreError::StoreUnavailable(
                "injected scan failure".to_string(),
            ));
        }
        self.scan_pages_until_failure
            .store(budget - 1, Ordering::SeqCst);
        Ok(())
    }

    fn parse_token(start: Option<&PageToken>) -> Result<usize, CoreError> {
        match start {
            None => Ok(0),
            Some(token) => token
                .as_str()
                .parse()
                .map_err(|_| CoreError::StoreUnavailable("invalid continuation token".to_string())),
        }
    }

    /// Slices one page out of an already-materialized logical result set,
    /// issuing a continuation token when records remain past the page.
    fn paginate(&self, matched: Vec<Record>, offset: usize) -> Page {
        let next = (offset + self.page_size < matched.len())
            .then(|| PageToken::new((offset + self.page_size).to_string()));
        let items = matched
            .into_iter()
            .skip(offset)
            .take(self.page_size)
            .collect();
        Page { items, next }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

/// Projects a record down to the requested fields.
fn project(record: &Record, fields: &[String]) -> Record {
    fields
        .iter()
        .filter_map(|f| record.get(f).map(|v| (f.clone(), v.clone())))
        .collect()
}

fn string_field<'a>(record: &'a Record, field: &str) -> &'a str {
    record
        .get(field)
        .and_then(serde_json::Value::as_str)
        .unwrap_or("")
}

#[async_trait]
impl PageSource for MemoryStore {
    async fn scan_page(
        &self,
        collection: Collection,
        spec: &ScanSpec,
        start: Option<&PageToken>,
    ) -> Result<Page, CoreError> {
        self.charge_scan_page()?;
        let offset = Self::parse_token(start)?;
        let map = self.collections.read().await;
        let matched: Vec<Record> = map
            .get(&collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| spec.filter.as_ref().is_none_or(|f| f.matches(r)))
                    .map(|r| match &spec.projection {
                        Some(fields) => project(r, fields),
                        None => r.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(self.paginate(matched, offset))
    }

    async fn query_page(
        &self,
        collection: Collection,
        spec: &QuerySpec,
        start: Option<&PageToken>,
    ) -> Result<Page, CoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(CoreError::StoreUnavailable(
                "injected query failure".to_string(),
            ));
        }
        let offset = Self::parse_token(start)?;
        let map = self.collections.read().await;
        let mut matched: Vec<Record> = map
            .get(&collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| string_field(r, spec.index.key_field()) == spec.key)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let sort_field = spec.index.sort_field();
        matched.sort_by(|a, b| {
            let key_a = (string_field(a, sort_field), string_field(a, "id"));
            let key_b = (string_field(b, sort_field), string_field(b, "id"));
            if spec.descending {
                key_b.cmp(&key_a)
            } else {
                key_a.cmp(&key_b)
            }
        });
        Ok(self.paginate(matched, offset))
    }

    async fn get_item(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Record>, CoreError> {
        let map = self.collections.read().await;
        Ok(map
            .get(&collection)
            .and_then(|records| records.iter().find(|r| string_field(r, "id") == id))
            .cloned())
    }

    async fn put_item(&self, collection: Collection, record: Record) -> Result<(), CoreError> {
        let id = string_field(&record, "id").to_string();
        let mut map = self.collections.write().await;
        let records = map.entry(collection).or_default();
        match records.iter_mut().find(|r| string_field(r, "id") == id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn update_field(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: serde_json::Value,
    ) -> Result<(), CoreError> {
        let mut map = self.collections.write().await;
        let record = map
            .get_mut(&collection)
            .and_then(|records| records.iter_mut().find(|r| string_field(r, "id") == id))
            .ok_or_else(|| CoreError::NotFound(format!("{}/{id}", collection.name())))?;
        record.insert(field.to_string(), value);
        Ok(())
    }

    async fn delete_item(&self, collection: Collection, id: &str) -> Result<(), CoreError> {
        let mut map = self.collections.write().await;
        if let Some(records) = map.get_mut(&collection) {
            records.retain(|r| string_field(r, "id") != id);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::store::{FilterExpr, SecondaryIndex, StoreAdapter};
    use std::sync::Arc;

    async fn seeded(page_size: usize, count: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new(page_size));
        for i in 0..count {
            store
                .insert(
                    Collection::Donations,
                    serde_json::json!({
                        "id": format!("d-{i:03}"),
                        "donor_id": "u-1",
                        "date": format!("2026-01-{:02}", (i % 28) + 1),
                        "status": "Scheduled",
                    }),
                )
                .await;
        }
        store
    }

    #[tokio::test]
    async fn scan_issues_tokens_and_adapter_exhausts_them() {
        let store = seeded(3, 10).await;
        let page = store
            .scan_page(Collection::Donations, &ScanSpec::all(), None)
            .await;
        let Ok(page) = page else {
            panic!("scan failed");
        };
        assert_eq!(page.items.len(), 3);
        assert!(page.next.is_some());

        let adapter = StoreAdapter::new(store);
        let all = adapter.scan_all(Collection::Donations, &ScanSpec::all()).await;
        let Ok(all) = all else {
            panic!("scan_all failed");
        };
        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn scan_failure_mid_pagination_propagates() {
        let store = seeded(2, 10).await;
        store.fail_scans_after(2);
        let adapter = StoreAdapter::new(store);
        let result = adapter.scan_all(Collection::Donations, &ScanSpec::all()).await;
        assert!(matches!(result, Err(CoreError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn query_sorts_descending_with_id_tie_break() {
        let store = Arc::new(MemoryStore::new(10));
        for (id, date) in [("d-a", "2026-03-01"), ("d-b", "2026-03-02"), ("d-c", "2026-03-02")] {
            store
                .insert(
                    Collection::Donations,
                    serde_json::json!({"id": id, "donor_id": "u-1", "date": date}),
                )
                .await;
        }
        let spec = QuerySpec::descending(SecondaryIndex::DonorDate, "u-1");
        let page = store.query_page(Collection::Donations, &spec, None).await;
        let Ok(page) = page else {
            panic!("query failed");
        };
        let ids: Vec<&str> = page
            .items
            .iter()
            .map(|r| r.get("id").and_then(serde_json::Value::as_str).unwrap_or(""))
            .collect();
        assert_eq!(ids, ["d-c", "d-b", "d-a"]);
    }

    #[tokio::test]
    async fn query_limit_truncates_exactly() {
        let store = seeded(2, 7).await;
        let adapter = StoreAdapter::new(store);
        let spec = QuerySpec::descending(SecondaryIndex::DonorDate, "u-1").with_limit(5);
        let result = adapter.query_all(Collection::Donations, &spec).await;
        let Ok(result) = result else {
            panic!("query_all failed");
        };
        assert_eq!(result.len(), 5);
    }

    #[tokio::test]
    async fn projection_strips_other_fields() {
        let store = seeded(10, 2).await;
        let spec = ScanSpec::all()
            .with_projection(["donor_id"])
            .with_filter(FilterExpr::exists("donor_id"));
        let page = store.scan_page(Collection::Donations, &spec, None).await;
        let Ok(page) = page else {
            panic!("scan failed");
        };
        let Some(first) = page.items.first() else {
            panic!("no records");
        };
        assert_eq!(first.len(), 1);
        assert!(first.contains_key("donor_id"));
    }

    #[tokio::test]
    async fn from_config_pages_at_the_configured_size() {
        let config = CoreConfig {
            scan_page_size: 2,
            ..CoreConfig::default()
        };
        let store = MemoryStore::from_config(&config);
        for i in 0..3 {
            store
                .insert(
                    Collection::Users,
                    serde_json::json!({"id": format!("u-{i}")}),
                )
                .await;
        }
        let page = store
            .scan_page(Collection::Users, &ScanSpec::all(), None)
            .await;
        let Ok(page) = page else {
            panic!("scan failed");
        };
        assert_eq!(page.items.len(), 2);
        assert!(page.next.is_some());
    }

    #[tokio::test]
    async fn update_field_requires_existing_record() {
        let store = MemoryStore::new(10);
        let result = store
            .update_field(Collection::Users, "missing", "blood_group", serde_json::json!("B+"))
            .await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn put_item_replaces_by_id() {
        let store = MemoryStore::new(10);
        store
            .insert(Collection::Users, serde_json::json!({"id": "u-1", "name": "Ada"}))
            .await;
        let replacement: Record =
            [("id".to_string(), serde_json::json!("u-1")), ("name".to_string(), serde_json::json!("Grace"))]
                .into_iter()
                .collect();
        let Ok(()) = store.put_item(Collection::Users, replacement).await else {
            panic!("put failed");
        };
        let fetched = store.get_item(Collection::Users, "u-1").await;
        let Ok(Some(fetched)) = fetched else {
            panic!("get failed");
        };
        assert_eq!(fetched.get("name"), Some(&serde_json::json!("Grace")));
    }
}
