//! Dashboard Assembler: role-specific summary payloads.
//!
//! Each role arm is an independent function over the same primitive
//! inputs — inventory snapshot, aggregation results, record listings —
//! composed into a role-tagged payload. No business logic lives here
//! beyond selection and labeling.
//!
//! Failure semantics: the requesting user's lookup is the single loud
//! gate (a store that cannot be reached at all surfaces one top-level
//! error). Past that gate, every aggregate and listing degrades to a
//! zero/empty default with a warning — one bad aggregate must never abort
//! the whole dashboard.

use std::collections::BTreeMap;

use chrono::Local;
use serde::Serialize;

use super::aggregation::Aggregator;
use super::inventory::{GroupInventory, InventoryCalculator, InventorySnapshot};
use super::matching::{MatchingService, annotate};
use crate::domain::{AnnotatedRequest, BloodRequest, Donation, RequestStatus, User};
use crate::error::CoreError;
use crate::store::repository::Repository;
use crate::store::{Collection, StoreAdapter};

/// Number of recent donations shown on the blood-bank dashboard.
const RECENT_DONATIONS: usize = 5;
/// Number of recent pending requests shown on the blood-bank dashboard.
const RECENT_PENDING_REQUESTS: usize = 10;

/// Dashboard role selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardRole {
    /// Donor: own donation history.
    Donor,
    /// Recipient: own requests with availability plus the inventory.
    Recipient,
    /// Blood bank: inventory, recent activity, operational stats.
    BloodBank,
    /// Administrator: full listings plus system-wide stats.
    Admin,
}

/// A recent donation as shown on the blood-bank dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct RecentDonor {
    /// Donor display name.
    pub name: String,
    /// Blood group label.
    pub blood_group: String,
    /// Date of the donation.
    pub last_donation: String,
}

impl From<&Donation> for RecentDonor {
    fn from(donation: &Donation) -> Self {
        let or_na = |s: &str| {
            if s.is_empty() {
                "N/A".to_string()
            } else {
                s.to_string()
            }
        };
        Self {
            name: if donation.donor_name.is_empty() {
                "Unknown".to_string()
            } else {
                donation.donor_name.clone()
            },
            blood_group: or_na(&donation.blood_group),
            last_donation: or_na(&donation.date),
        }
    }
}

/// Operational stats for the blood-bank dashboard.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BankStats {
    /// Distinct donors across all donation records.
    pub total_donors: usize,
    /// Requests currently pending.
    pub pending_requests: usize,
    /// Sum of inventory units across all groups.
    pub total_units: u64,
    /// Donations dated today (exact date-string match).
    pub today_donations: usize,
}

/// System-wide stats for the admin dashboard.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdminStats {
    /// Total user accounts.
    pub total_users: usize,
    /// Distinct donors across all donation records.
    pub donors_count: usize,
    /// Distinct requesters across all request records.
    pub recipients_count: usize,
    /// Users with the `bloodbank` role.
    pub banks_count: usize,
    /// Total blood requests.
    pub total_requests: usize,
    /// Requests currently pending.
    pub pending_requests: usize,
    /// Requests fulfilled.
    pub completed_requests: usize,
    /// Total donation records.
    pub total_donations: usize,
    /// Donations dated today (exact date-string match).
    pub today_donations: usize,
    /// Sum of inventory units across all groups.
    pub total_inventory: u64,
}

/// Role-tagged dashboard payload, serialized with a `view` discriminator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DashboardPayload {
    /// Donor view.
    Donor {
        /// Own donations, most recent first.
        donations: Vec<Donation>,
    },
    /// Recipient view.
    Recipient {
        /// Own requests annotated with availability, most recent first.
        requests: Vec<AnnotatedRequest>,
        /// Full inventory snapshot in raw mapping form.
        inventory: BTreeMap<&'static str, u64>,
    },
    /// Blood-bank view.
    #[serde(rename = "bloodbank")]
    BloodBank {
        /// Operational stats.
        stats: BankStats,
        /// Most recent donations system-wide.
        donors: Vec<RecentDonor>,
        /// Inventory as an ordered sequence over canonical groups.
        inventory: Vec<GroupInventory>,
        /// Most recent pending requests.
        requests: Vec<BloodRequest>,
        /// Display date (e.g. `23 Aug 2026`).
        today: String,
    },
    /// Admin view.
    Admin {
        /// System-wide stats.
        stats: AdminStats,
        /// Inventory as an ordered sequence over canonical groups.
        inventory: Vec<GroupInventory>,
        /// All users, blood groups back-filled where inferable.
        users: Vec<User>,
        /// All requests, most recent first.
        requests: Vec<BloodRequest>,
        /// All donations, most recent first.
        donations: Vec<Donation>,
    },
    /// The user has not chosen a role yet.
    ChooseRole,
}

/// Assembles role-specific dashboard payloads.
#[derive(Debug, Clone)]
pub struct DashboardService {
    repository: Repository,
    aggregator: Aggregator,
    inventory: InventoryCalculator,
}

impl DashboardService {
    /// Creates a dashboard service over the given adapter.
    #[must_use]
    pub fn new(store: StoreAdapter) -> Self {
        let repository = Repository::new(store.clone());
        let aggregator = Aggregator::new(store);
        let inventory = InventoryCalculator::new(aggregator.clone());
        Self {
            repository,
            aggregator,
            inventory,
        }
    }

    /// The matching service sharing this dashboard's data access, for the
    /// standalone "my requests" listing.
    #[must_use]
    pub fn matching(&self) -> MatchingService {
        MatchingService::new(self.repository.clone(), self.inventory.clone())
    }

    /// Assembles the dashboard for a user, resolving the role from the
    /// user record.
    ///
    /// Blood-bank and admin accounts dispatch on the account `role`. Every
    /// other account dispatches on the explicitly selected `current_role`
    /// only; a dual-role account that never picked one gets
    /// [`DashboardPayload::ChooseRole`], not a guessed view.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the user does not exist, or
    /// [`CoreError::StoreUnavailable`] if the user lookup itself fails.
    pub async fn dashboard_for_user(&self, user_id: &str) -> Result<DashboardPayload, CoreError> {
        let user = self
            .repository
            .find_user(user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;
        let role = match user.role.as_deref() {
            Some("bloodbank") => DashboardRole::BloodBank,
            Some("admin") => DashboardRole::Admin,
            _ => match user.current_role.as_deref() {
                Some("donor") => DashboardRole::Donor,
                Some("recipient") => DashboardRole::Recipient,
                _ => return Ok(DashboardPayload::ChooseRole),
            },
        };
        self.assemble(role, user_id).await
    }

    /// Assembles the dashboard for an explicit role.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the user does not exist, or
    /// [`CoreError::StoreUnavailable`] if the user lookup itself fails.
    pub async fn dashboard_payload(
        &self,
        role: DashboardRole,
        user_id: &str,
    ) -> Result<DashboardPayload, CoreError> {
        self.repository
            .find_user(user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;
        self.assemble(role, user_id).await
    }

    async fn assemble(
        &self,
        role: DashboardRole,
        user_id: &str,
    ) -> Result<DashboardPayload, CoreError> {
        Ok(match role {
            DashboardRole::Donor => self.donor_view(user_id).await,
            DashboardRole::Recipient => self.recipient_view(user_id).await,
            DashboardRole::BloodBank => self.bank_view().await,
            DashboardRole::Admin => self.admin_view().await,
        })
    }

    /// Donor view: own donation history, most recent first.
    ///
    /// Dates have day-only granularity, so ties are broken by record id
    /// descending for a deterministic order.
    async fn donor_view(&self, user_id: &str) -> DashboardPayload {
        let mut donations = or_default(
            self.repository.donations_by_donor(user_id, None).await,
            "donor donations",
        );
        donations.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        DashboardPayload::Donor { donations }
    }

    /// Recipient view: own requests annotated against an inventory
    /// snapshot computed in this same operation, plus that snapshot.
    async fn recipient_view(&self, user_id: &str) -> DashboardPayload {
        let snapshot = or_default(self.inventory.compute_inventory().await, "inventory");
        let requests = or_default(
            self.repository.requests_by_requester(user_id).await,
            "recipient requests",
        );
        DashboardPayload::Recipient {
            requests: annotate(requests, &snapshot),
            inventory: snapshot.to_map(),
        }
    }

    /// Blood-bank view: inventory, recent activity, operational stats.
    async fn bank_view(&self) -> DashboardPayload {
        let today = Local::now().format("%Y-%m-%d").to_string();
        let snapshot = or_default(self.inventory.compute_inventory().await, "inventory");
        let donors: Vec<RecentDonor> = or_default(
            self.repository.recent_donations(RECENT_DONATIONS).await,
            "recent donations",
        )
        .iter()
        .map(RecentDonor::from)
        .collect();
        let requests = or_default(
            self.repository
                .pending_requests(Some(RECENT_PENDING_REQUESTS))
                .await,
            "pending requests",
        );
        let stats = BankStats {
            total_donors: or_default(
                self.aggregator
                    .count_distinct(Collection::Donations, "donor_id")
                    .await,
                "donor count",
            ),
            pending_requests: or_default(
                self.aggregator
                    .count_by_status(
                        Collection::BloodRequests,
                        RequestStatus::Pending.as_str(),
                    )
                    .await,
                "pending count",
            ),
            total_units: snapshot.total_units(),
            today_donations: or_default(
                self.aggregator
                    .count_by_date(Collection::Donations, &today)
                    .await,
                "today's donations",
            ),
        };
        DashboardPayload::BloodBank {
            stats,
            donors,
            inventory: snapshot.as_sequence(),
            requests,
            today: Local::now().format("%d %b %Y").to_string(),
        }
    }

    /// Admin view: full listings plus system-wide stats.
    async fn admin_view(&self) -> DashboardPayload {
        let today = Local::now().format("%Y-%m-%d").to_string();
        let snapshot = or_default(self.inventory.compute_inventory().await, "inventory");
        let users = self
            .enrich_users(or_default(
                self.repository.list_all_users().await,
                "user listing",
            ))
            .await;
        let requests = or_default(
            self.repository.all_requests_sorted().await,
            "request listing",
        );
        let donations = or_default(
            self.repository.all_donations_sorted().await,
            "donation listing",
        );
        let stats = AdminStats {
            total_users: users.len(),
            donors_count: or_default(
                self.aggregator
                    .count_distinct(Collection::Donations, "donor_id")
                    .await,
                "donor count",
            ),
            recipients_count: or_default(
                self.aggregator
                    .count_distinct(Collection::BloodRequests, "requester_id")
                    .await,
                "recipient count",
            ),
            banks_count: or_default(
                self.repository.count_users_by_role("bloodbank").await,
                "bank count",
            ),
            total_requests: requests.len(),
            pending_requests: or_default(
                self.aggregator
                    .count_by_status(
                        Collection::BloodRequests,
                        RequestStatus::Pending.as_str(),
                    )
                    .await,
                "pending count",
            ),
            completed_requests: or_default(
                self.aggregator
                    .count_by_status(
                        Collection::BloodRequests,
                        RequestStatus::Fulfilled.as_str(),
                    )
                    .await,
                "fulfilled count",
            ),
            total_donations: donations.len(),
            today_donations: or_default(
                self.aggregator
                    .count_by_date(Collection::Donations, &today)
                    .await,
                "today's donations",
            ),
            total_inventory: snapshot.total_units(),
        };
        DashboardPayload::Admin {
            stats,
            inventory: snapshot.as_sequence(),
            users,
            requests,
            donations,
        }
    }

    /// Infers a missing blood group from the user's most recent donation.
    ///
    /// Returns `None` without touching the store when the field already
    /// holds a non-empty value — a second dashboard view never re-triggers
    /// the lookup. A stored empty string counts as absent and is
    /// re-inferred.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] if the donation lookup
    /// fails.
    pub async fn infer_blood_group(&self, user: &User) -> Result<Option<String>, CoreError> {
        let present = user
            .blood_group
            .as_deref()
            .is_some_and(|group| !group.is_empty());
        if present || user.id.is_empty() {
            return Ok(None);
        }
        let latest = self.repository.donations_by_donor(&user.id, Some(1)).await?;
        Ok(latest
            .first()
            .filter(|d| !d.blood_group.is_empty())
            .map(|d| d.blood_group.clone()))
    }

    /// Back-fills missing user blood groups from donation history.
    ///
    /// Two explicit steps per user: [`Self::infer_blood_group`] (read),
    /// then a best-effort persist so future reads avoid the lookup. A
    /// failed lookup or persist skips that single user — the user keeps
    /// its original value and assembly continues.
    pub async fn enrich_users(&self, users: Vec<User>) -> Vec<User> {
        let mut enriched = Vec::with_capacity(users.len());
        for mut user in users {
            match self.infer_blood_group(&user).await {
                Ok(Some(group)) => {
                    if let Err(err) = self
                        .repository
                        .set_user_blood_group(&user.id, &group)
                        .await
                    {
                        tracing::warn!(%err, user_id = %user.id, "blood-group back-fill not persisted");
                    }
                    user.blood_group = Some(group);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(%err, user_id = %user.id, "blood-group inference skipped");
                }
            }
            enriched.push(user);
        }
        enriched
    }
}

/// Downgrades a failed aggregate to its default with a warning.
fn or_default<T: Default>(result: Result<T, CoreError>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(%err, what, "aggregate unavailable; using default");
            T::default()
        }
    }
}
