//! Donation repository and service traits.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::donations_model::{DonationRecord, DonationStatus, DonationSubmission, NewDonationRecord};
use crate::books::BookCounts;
use crate::errors::Result;

/// Trait defining the contract for donation record persistence.
#[async_trait]
pub trait DonationRepositoryTrait: Send + Sync {
    /// Inserts a record with `allocated_count` zero and status `submitted`.
    async fn create(&self, new_donation: NewDonationRecord) -> Result<DonationRecord>;

    fn find_by_id(&self, donation_id: &str) -> Result<Option<DonationRecord>>;

    /// A donor's records in one drive, oldest first.
    ///
    /// Ordering is ascending `donation_date`, ties broken by creation order.
    /// An empty `statuses` slice means any status.
    fn list_for_donor_in_drive(
        &self,
        donor_id: &str,
        drive_id: &str,
        statuses: &[DonationStatus],
    ) -> Result<Vec<DonationRecord>>;

    /// All records of a drive, oldest first, same ordering rules as above.
    fn list_for_drive(
        &self,
        drive_id: &str,
        statuses: &[DonationStatus],
    ) -> Result<Vec<DonationRecord>>;

    /// Every record of a donor across all drives, newest first.
    fn list_for_donor(&self, donor_id: &str) -> Result<Vec<DonationRecord>>;

    /// Every record, newest first.
    fn list_all(&self) -> Result<Vec<DonationRecord>>;

    /// Overwrites `allocated_count` for each `(donation_id, allocated_count)` pair.
    async fn update_allocated_counts(&self, updates: Vec<(String, BookCounts)>) -> Result<()>;

    async fn update_status(
        &self,
        donation_id: &str,
        status: DonationStatus,
        collected_at: Option<NaiveDateTime>,
    ) -> Result<DonationRecord>;
}

/// Trait defining the contract for donor-facing donation operations.
#[async_trait]
pub trait DonationServiceTrait: Send + Sync {
    async fn submit_donation(
        &self,
        donor_id: &str,
        submission: DonationSubmission,
    ) -> Result<DonationRecord>;

    /// Moves a donation through its lifecycle. `collected_at` is stamped on collection.
    async fn update_donation_status(
        &self,
        donation_id: &str,
        status: DonationStatus,
    ) -> Result<DonationRecord>;

    fn get_donations_for_donor(&self, donor_id: &str) -> Result<Vec<DonationRecord>>;

    fn get_all_donations(&self) -> Result<Vec<DonationRecord>>;
}
