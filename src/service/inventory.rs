//! Inventory Calculator: the live blood-unit inventory derived from
//! donation records.
//!
//! [`InventorySnapshot`] is the single source of truth for "how many units
//! of group X are currently available". It is recomputed on every request
//! — there is no cache, so there is no cache invalidation problem. The
//! Availability Matcher and the Dashboard Assembler both consume this type
//! rather than recomputing independently, so the two always agree within
//! one logical request.

use std::collections::BTreeMap;

use serde::Serialize;

use super::aggregation::Aggregator;
use crate::domain::{BloodGroup, DonationStatus};
use crate::error::CoreError;
use crate::store::Collection;

/// One entry of the ordered inventory sequence.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GroupInventory {
    /// Canonical blood group.
    pub group: BloodGroup,
    /// Available units.
    pub units: u64,
}

/// Derived mapping from each canonical blood group to its available unit
/// count: donations with status Scheduled or Completed, bucketed by group.
///
/// Defined for all 8 canonical groups — absent groups hold 0. Never
/// persisted, never mutated; availability computations only read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventorySnapshot {
    units: [u64; 8],
}

impl InventorySnapshot {
    /// Builds a snapshot from grouped counts keyed by group label.
    #[must_use]
    pub fn from_counts(counts: &std::collections::HashMap<String, u64>) -> Self {
        let mut units = [0u64; 8];
        for (slot, group) in units.iter_mut().zip(BloodGroup::ALL) {
            *slot = counts.get(group.label()).copied().unwrap_or(0);
        }
        Self { units }
    }

    /// An all-zero snapshot.
    #[must_use]
    pub const fn empty() -> Self {
        Self { units: [0; 8] }
    }

    /// Available units for a canonical group.
    #[must_use]
    pub fn units_for(&self, group: BloodGroup) -> u64 {
        self.units
            .get(group.canonical_index())
            .copied()
            .unwrap_or(0)
    }

    /// Available units for a stored blood-group string; unknown or
    /// malformed groups resolve to 0, never an error.
    #[must_use]
    pub fn units_for_label(&self, label: &str) -> u64 {
        BloodGroup::parse(label)
            .map(|g| self.units_for(g))
            .unwrap_or(0)
    }

    /// Sum of all units across groups.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.units.iter().sum()
    }

    /// The snapshot as a sequence in canonical group order.
    #[must_use]
    pub fn as_sequence(&self) -> Vec<GroupInventory> {
        BloodGroup::ALL
            .iter()
            .map(|&group| GroupInventory {
                group,
                units: self.units_for(group),
            })
            .collect()
    }

    /// The snapshot as a raw label-to-units mapping.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, u64> {
        BloodGroup::ALL
            .iter()
            .map(|&group| (group.label(), self.units_for(group)))
            .collect()
    }
}

impl Default for InventorySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Computes inventory snapshots via the Aggregation Engine.
#[derive(Debug, Clone)]
pub struct InventoryCalculator {
    aggregator: Aggregator,
}

impl InventoryCalculator {
    /// Creates a calculator over the given aggregator.
    #[must_use]
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    /// Computes the current inventory snapshot.
    ///
    /// Counts donation records with status Scheduled or Completed, grouped
    /// by blood group. Cancelled donations never contribute.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn compute_inventory(&self) -> Result<InventorySnapshot, CoreError> {
        let groups: Vec<&str> = BloodGroup::ALL.iter().map(BloodGroup::label).collect();
        let statuses: Vec<&str> = DonationStatus::IN_INVENTORY
            .iter()
            .map(DonationStatus::as_str)
            .collect();
        let counts = self
            .aggregator
            .count_grouped(
                Collection::Donations,
                "blood_group",
                &groups,
                "status",
                &statuses,
            )
            .await?;
        Ok(InventorySnapshot::from_counts(&counts))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::store::StoreAdapter;
    use crate::store::memory::MemoryStore;
    use rand::Rng;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn calculator(store: Arc<MemoryStore>) -> InventoryCalculator {
        InventoryCalculator::new(Aggregator::new(StoreAdapter::new(store)))
    }

    #[tokio::test]
    async fn empty_store_yields_all_eight_zero_entries() {
        let calc = calculator(Arc::new(MemoryStore::new(3)));
        let snapshot = calc.compute_inventory().await;
        let Ok(snapshot) = snapshot else {
            panic!("compute_inventory failed");
        };
        let sequence = snapshot.as_sequence();
        assert_eq!(sequence.len(), 8);
        assert!(sequence.iter().all(|entry| entry.units == 0));
        assert_eq!(snapshot.total_units(), 0);
    }

    #[tokio::test]
    async fn cancelled_donations_are_excluded() {
        let store = Arc::new(MemoryStore::new(3));
        store
            .insert(
                Collection::Donations,
                serde_json::json!({"id": "d-1", "blood_group": "AB-", "status": "Cancelled"}),
            )
            .await;
        let calc = calculator(store);
        let snapshot = calc.compute_inventory().await;
        let Ok(snapshot) = snapshot else {
            panic!("compute_inventory failed");
        };
        assert_eq!(snapshot.units_for(BloodGroup::AbNeg), 0);
    }

    #[tokio::test]
    async fn matches_brute_force_over_randomized_donations() {
        let store = Arc::new(MemoryStore::new(7));
        let mut rng = rand::thread_rng();
        let statuses = ["Scheduled", "Completed", "Cancelled"];
        let mut expected: HashMap<&str, u64> = HashMap::new();
        for i in 0..200 {
            let group = BloodGroup::ALL
                .get(rng.gen_range(0..BloodGroup::ALL.len()))
                .copied()
                .unwrap_or(BloodGroup::OPos);
            let status = statuses
                .get(rng.gen_range(0..statuses.len()))
                .copied()
                .unwrap_or("Scheduled");
            if status != "Cancelled" {
                *expected.entry(group.label()).or_default() += 1;
            }
            store
                .insert(
                    Collection::Donations,
                    serde_json::json!({
                        "id": format!("d-{i}"),
                        "blood_group": group.label(),
                        "status": status,
                    }),
                )
                .await;
        }
        let calc = calculator(store);
        let snapshot = calc.compute_inventory().await;
        let Ok(snapshot) = snapshot else {
            panic!("compute_inventory failed");
        };
        for group in BloodGroup::ALL {
            assert_eq!(
                snapshot.units_for(group),
                expected.get(group.label()).copied().unwrap_or(0),
                "mismatch for {group}"
            );
        }
    }

    #[tokio::test]
    async fn recomputation_is_idempotent() {
        let store = Arc::new(MemoryStore::new(2));
        for i in 0..5 {
            store
                .insert(
                    Collection::Donations,
                    serde_json::json!({"id": format!("d-{i}"), "blood_group": "B+", "status": "Completed"}),
                )
                .await;
        }
        let calc = calculator(store);
        let first = calc.compute_inventory().await;
        let second = calc.compute_inventory().await;
        let (Ok(first), Ok(second)) = (first, second) else {
            panic!("compute_inventory failed");
        };
        assert_eq!(first, second);
        assert_eq!(first.units_for(BloodGroup::BPos), 5);
    }

    #[test]
    fn unknown_label_resolves_to_zero() {
        let snapshot = InventorySnapshot::empty();
        assert_eq!(snapshot.units_for_label("Z-"), 0);
    }

    #[test]
    fn sequence_follows_canonical_order() {
        let mut counts = HashMap::new();
        counts.insert("O+".to_string(), 4u64);
        let snapshot = InventorySnapshot::from_counts(&counts);
        let labels: Vec<&str> = snapshot
            .as_sequence()
            .iter()
            .map(|e| e.group.label())
            .collect();
        assert_eq!(labels, ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"]);
        assert_eq!(snapshot.to_map().get("O+"), Some(&4));
    }
}
