use async_trait::async_trait;

use super::drives_model::{DonationDrive, DriveStatus, NewDonationDrive};
use crate::books::BookCounts;
use crate::errors::Result;

/// Trait defining the contract for donation drive repository operations.
#[async_trait]
pub trait DriveRepositoryTrait: Send + Sync {
    async fn create(&self, new_drive: NewDonationDrive) -> Result<DonationDrive>;

    fn find_by_id(&self, drive_id: &str) -> Result<Option<DonationDrive>>;

    /// Lists drives newest first, optionally filtered by status.
    fn list(&self, status_filter: Option<DriveStatus>) -> Result<Vec<DonationDrive>>;

    /// Adds `books` to the drive's received vector and recomputes the total
    /// from the resulting breakdown.
    async fn add_books_received(&self, drive_id: &str, books: BookCounts)
        -> Result<DonationDrive>;

    /// Replaces the received vector and total. Used by the totals repair.
    async fn set_books_received(
        &self,
        drive_id: &str,
        books: BookCounts,
        total: u64,
    ) -> Result<DonationDrive>;
}

/// Trait defining the contract for donation drive service operations.
#[async_trait]
pub trait DriveServiceTrait: Send + Sync {
    async fn create_drive(&self, new_drive: NewDonationDrive) -> Result<DonationDrive>;

    fn get_drive(&self, drive_id: &str) -> Result<DonationDrive>;
}
