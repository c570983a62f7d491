//! Business services: aggregation, inventory, availability matching, and
//! dashboard assembly.

pub mod aggregation;
pub mod dashboard;
pub mod inventory;
pub mod matching;

pub use aggregation::Aggregator;
pub use dashboard::{
    AdminStats, BankStats, DashboardPayload, DashboardRole, DashboardService, RecentDonor,
};
pub use inventory::{GroupInventory, InventoryCalculator, InventorySnapshot};
pub use matching::{MatchingService, annotate};
