//! Domain types: canonical blood groups and the three record collections.

pub mod blood_group;
pub mod donation;
pub mod request;
pub mod user;

pub use blood_group::BloodGroup;
pub use donation::{Donation, DonationStatus};
pub use request::{AnnotatedRequest, BloodRequest, RequestStatus};
pub use user::User;
