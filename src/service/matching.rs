//! Availability Matcher: joins pending requests against the inventory
//! snapshot.
//!
//! [`annotate`] is the only place the `is_available` rule lives; the
//! recipient dashboard and the "my requests" listing both go through it so
//! the two views can never drift.

use super::inventory::{InventoryCalculator, InventorySnapshot};
use crate::domain::{AnnotatedRequest, BloodRequest};
use crate::error::CoreError;
use crate::store::repository::Repository;

/// Annotates each request with availability against the snapshot.
///
/// Input order is preserved. For each request: `requested_units` is the
/// lenient integer reading of the stored units (non-numeric, missing, or
/// non-positive read as 0); `available_units` comes from the snapshot
/// (unknown blood groups resolve to 0); `is_available` is true iff units
/// were requested and the inventory covers them. No stored request is
/// mutated and no inventory is reserved — this engine computes
/// availability, it never decrements it.
#[must_use]
pub fn annotate(
    requests: Vec<BloodRequest>,
    inventory: &InventorySnapshot,
) -> Vec<AnnotatedRequest> {
    requests
        .into_iter()
        .map(|request| {
            let requested_units = request.requested_units();
            let available_units = inventory.units_for_label(&request.blood_group);
            AnnotatedRequest {
                available_units,
                is_available: requested_units > 0 && available_units >= requested_units,
                request,
            }
        })
        .collect()
}

/// Inventory and request-availability service.
#[derive(Debug, Clone)]
pub struct MatchingService {
    repository: Repository,
    inventory: InventoryCalculator,
}

impl MatchingService {
    /// Creates a matching service.
    #[must_use]
    pub fn new(repository: Repository, inventory: InventoryCalculator) -> Self {
        Self {
            repository,
            inventory,
        }
    }

    /// Computes the current inventory snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn inventory(&self) -> Result<InventorySnapshot, CoreError> {
        self.inventory.compute_inventory().await
    }

    /// A requester's own requests, most recent first, annotated against a
    /// snapshot computed in this same operation (never a stale value).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn requests_with_availability(
        &self,
        requester_id: &str,
    ) -> Result<Vec<AnnotatedRequest>, CoreError> {
        let inventory = self.inventory.compute_inventory().await?;
        let requests = self.repository.requests_by_requester(requester_id).await?;
        Ok(annotate(requests, &inventory))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::RequestStatus;
    use std::collections::HashMap;

    fn snapshot(label: &str, units: u64) -> InventorySnapshot {
        let mut counts = HashMap::new();
        counts.insert(label.to_string(), units);
        InventorySnapshot::from_counts(&counts)
    }

    fn request(id: &str, group: &str, units: serde_json::Value) -> BloodRequest {
        BloodRequest {
            id: id.to_string(),
            requester_id: "u-1".to_string(),
            patient_name: "Pat".to_string(),
            blood_group: group.to_string(),
            units,
            hospital: "General".to_string(),
            status: RequestStatus::Pending,
            timestamp: "2026-08-23T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn exact_inventory_boundary() {
        let inventory = snapshot("O+", 3);
        let annotated = annotate(
            vec![
                request("r-1", "O+", serde_json::json!(3)),
                request("r-2", "O+", serde_json::json!(4)),
            ],
            &inventory,
        );
        let (Some(first), Some(second)) = (annotated.first(), annotated.get(1)) else {
            panic!("missing annotations");
        };
        assert!(first.is_available);
        assert_eq!(first.available_units, 3);
        assert!(!second.is_available);
        assert_eq!(second.available_units, 3);
    }

    #[test]
    fn zero_or_garbage_units_are_never_available() {
        let inventory = snapshot("O+", 10);
        let annotated = annotate(
            vec![
                request("r-1", "O+", serde_json::json!(0)),
                request("r-2", "O+", serde_json::json!("many")),
                request("r-3", "O+", serde_json::Value::Null),
            ],
            &inventory,
        );
        assert!(annotated.iter().all(|a| !a.is_available));
    }

    #[test]
    fn unknown_blood_group_reads_zero_available() {
        let inventory = snapshot("O+", 10);
        let annotated = annotate(vec![request("r-1", "X-", serde_json::json!(1))], &inventory);
        let Some(first) = annotated.first() else {
            panic!("missing annotation");
        };
        assert_eq!(first.available_units, 0);
        assert!(!first.is_available);
    }

    #[test]
    fn input_order_is_preserved() {
        let inventory = snapshot("A+", 1);
        let annotated = annotate(
            vec![
                request("r-3", "A+", serde_json::json!(1)),
                request("r-1", "A+", serde_json::json!(1)),
                request("r-2", "A+", serde_json::json!(1)),
            ],
            &inventory,
        );
        let ids: Vec<&str> = annotated.iter().map(|a| a.request.id.as_str()).collect();
        assert_eq!(ids, ["r-3", "r-1", "r-2"]);
    }
}
