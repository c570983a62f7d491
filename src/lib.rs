//! # bloodbridge-core
//!
//! Coordination engine for a blood-donation platform: live inventory
//! derived from donation records, request-availability matching, and
//! role-specific dashboard assembly over a paginated record store.
//!
//! The physical store, HTTP surface, authentication, and rendering are
//! external collaborators — this crate owns the data-access and matching
//! semantics between them.
//!
//! ## Architecture
//!
//! ```text
//! Callers (HTTP surface, jobs)
//!     │
//!     ├── DashboardService (service/dashboard)
//!     ├── MatchingService (service/matching)
//!     │
//!     ├── InventoryCalculator (service/inventory)
//!     ├── Aggregator (service/aggregation)
//!     │
//!     ├── Repository (store/repository)
//!     ├── StoreAdapter (store/) ── PageSource backends
//!     │
//!     └── domain/ record types
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;
