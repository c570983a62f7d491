//! Typed record operations over the [`StoreAdapter`].
//!
//! One method per logical operation the services need, mirroring the
//! collection layout in the backing store. Listing methods parse records
//! leniently and skip malformed ones with a warning — a single bad record
//! must never abort a listing.

use chrono::{SecondsFormat, Utc};

use super::{Collection, FilterExpr, QuerySpec, Record, ScanSpec, SecondaryIndex, StoreAdapter};
use crate::domain::{BloodGroup, BloodRequest, Donation, DonationStatus, RequestStatus, User};
use crate::error::CoreError;

/// Typed data access for users, donations, and blood requests.
#[derive(Debug, Clone)]
pub struct Repository {
    store: StoreAdapter,
}

impl Repository {
    /// Creates a repository over the given adapter.
    #[must_use]
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    /// The underlying adapter, for aggregate computations.
    #[must_use]
    pub fn store(&self) -> &StoreAdapter {
        &self.store
    }

    /// Parses records into `T`, skipping malformed ones.
    fn parse_each<T>(
        records: Vec<Record>,
        parse: impl Fn(&Record) -> Result<T, CoreError>,
        what: &str,
    ) -> Vec<T> {
        records
            .iter()
            .filter_map(|record| match parse(record) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::warn!(%err, what, "skipping malformed record");
                    None
                }
            })
            .collect()
    }

    // ----- Users -----

    /// Fetches a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure or
    /// [`CoreError::MalformedRecord`] if the stored user cannot be parsed.
    pub async fn find_user(&self, user_id: &str) -> Result<Option<User>, CoreError> {
        match self.store.get_item(Collection::Users, user_id).await? {
            Some(record) => Ok(Some(User::from_record(&record)?)),
            None => Ok(None),
        }
    }

    /// Lists every user.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn list_all_users(&self) -> Result<Vec<User>, CoreError> {
        let records = self
            .store
            .scan_all(Collection::Users, &ScanSpec::all())
            .await?;
        Ok(Self::parse_each(records, User::from_record, "user"))
    }

    /// Persists a back-filled blood group on a user record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure or
    /// [`CoreError::NotFound`] if the user no longer exists.
    pub async fn set_user_blood_group(
        &self,
        user_id: &str,
        group: &str,
    ) -> Result<(), CoreError> {
        self.store
            .update_field(
                Collection::Users,
                user_id,
                "blood_group",
                serde_json::Value::String(group.to_string()),
            )
            .await
    }

    /// Deletes a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), CoreError> {
        self.store.delete_item(Collection::Users, user_id).await
    }

    // ----- Donations -----

    /// Creates a donation record with status `Scheduled`, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn create_donation(
        &self,
        donor_id: &str,
        donor_name: &str,
        blood_group: BloodGroup,
        date: &str,
        location: &str,
        time_slot: &str,
    ) -> Result<String, CoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record: Record = [
            ("id", serde_json::json!(id)),
            ("donor_id", serde_json::json!(donor_id)),
            ("donor_name", serde_json::json!(donor_name)),
            ("blood_group", serde_json::json!(blood_group.label())),
            ("date", serde_json::json!(date)),
            ("location", serde_json::json!(location)),
            ("time_slot", serde_json::json!(time_slot)),
            ("status", serde_json::json!(DonationStatus::Scheduled.as_str())),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        self.store.put_item(Collection::Donations, record).await?;
        Ok(id)
    }

    /// A donor's own donations, most recent first, optionally capped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn donations_by_donor(
        &self,
        donor_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Donation>, CoreError> {
        let mut spec = QuerySpec::descending(SecondaryIndex::DonorDate, donor_id);
        spec.limit = limit;
        let records = self.store.query_all(Collection::Donations, &spec).await?;
        Ok(Self::parse_each(records, Donation::from_record, "donation"))
    }

    /// The `limit` most recent donations system-wide.
    ///
    /// The store has no cross-donor recency index, so this is a projection
    /// scan followed by a client-side date sort.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn recent_donations(&self, limit: usize) -> Result<Vec<Donation>, CoreError> {
        let spec =
            ScanSpec::all().with_projection(["donor_name", "blood_group", "date", "location"]);
        let records = self.store.scan_all(Collection::Donations, &spec).await?;
        let mut donations = Self::parse_each(records, Donation::from_record, "donation");
        donations.sort_by(|a, b| b.date.cmp(&a.date));
        donations.truncate(limit);
        Ok(donations)
    }

    /// Every donation, sorted by date descending.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn all_donations_sorted(&self) -> Result<Vec<Donation>, CoreError> {
        let records = self
            .store
            .scan_all(Collection::Donations, &ScanSpec::all())
            .await?;
        let mut donations = Self::parse_each(records, Donation::from_record, "donation");
        donations.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        Ok(donations)
    }

    // ----- Blood requests -----

    /// Creates a pending blood request, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn create_blood_request(
        &self,
        requester_id: &str,
        patient_name: &str,
        blood_group: BloodGroup,
        units: u32,
        hospital: &str,
    ) -> Result<String, CoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let record: Record = [
            ("id", serde_json::json!(id)),
            ("requester_id", serde_json::json!(requester_id)),
            ("patient_name", serde_json::json!(patient_name)),
            ("blood_group", serde_json::json!(blood_group.label())),
            ("units", serde_json::json!(units)),
            ("hospital", serde_json::json!(hospital)),
            ("status", serde_json::json!(RequestStatus::Pending.as_str())),
            ("timestamp", serde_json::json!(timestamp)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        self.store
            .put_item(Collection::BloodRequests, record)
            .await?;
        Ok(id)
    }

    /// A requester's own requests, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn requests_by_requester(
        &self,
        requester_id: &str,
    ) -> Result<Vec<BloodRequest>, CoreError> {
        let spec = QuerySpec::descending(SecondaryIndex::RequesterTimestamp, requester_id);
        let records = self
            .store
            .query_all(Collection::BloodRequests, &spec)
            .await?;
        Ok(Self::parse_each(
            records,
            BloodRequest::from_record,
            "blood request",
        ))
    }

    /// Pending requests, most recent first, optionally capped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn pending_requests(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<BloodRequest>, CoreError> {
        let mut spec = QuerySpec::descending(
            SecondaryIndex::StatusTimestamp,
            RequestStatus::Pending.as_str(),
        );
        spec.limit = limit;
        let records = self
            .store
            .query_all(Collection::BloodRequests, &spec)
            .await?;
        Ok(Self::parse_each(
            records,
            BloodRequest::from_record,
            "blood request",
        ))
    }

    /// Every request, sorted by timestamp descending.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn all_requests_sorted(&self) -> Result<Vec<BloodRequest>, CoreError> {
        let records = self
            .store
            .scan_all(Collection::BloodRequests, &ScanSpec::all())
            .await?;
        let mut requests = Self::parse_each(records, BloodRequest::from_record, "blood request");
        requests.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        Ok(requests)
    }

    /// Counts users whose `role` equals the given role string.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreUnavailable`] on backend failure.
    pub async fn count_users_by_role(&self, role: &str) -> Result<usize, CoreError> {
        let spec = ScanSpec::all()
            .with_projection(["id"])
            .with_filter(FilterExpr::eq("role", role));
        let records = self.store.scan_all(Collection::Users, &spec).await?;
        Ok(records.len())
    }
}
