//! Allocation repository, store and service traits.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::allocations_model::{
    AllocationCommit, AllocationCommitOutcome, AllocationFilter, AllocationRequest,
    AllocationStatus, BookAllocation, DonorAllocationHistory, DonorInventory, DriveInventory,
    NewBookAllocation,
};
use crate::errors::Result;

/// Trait defining the contract for allocation record persistence.
#[async_trait]
pub trait AllocationRepositoryTrait: Send + Sync {
    async fn create(&self, new_allocation: NewBookAllocation) -> Result<BookAllocation>;

    fn find_by_id(&self, allocation_id: &str) -> Result<Option<BookAllocation>>;

    /// Allocations matching `filter`, newest first.
    fn list(&self, filter: &AllocationFilter) -> Result<Vec<BookAllocation>>;

    /// Allocations whose `donations_used` contains any of `donation_ids`, newest first.
    fn list_using_donations(&self, donation_ids: &[String]) -> Result<Vec<BookAllocation>>;

    async fn update_status(
        &self,
        allocation_id: &str,
        status: AllocationStatus,
        delivery_date: Option<NaiveDateTime>,
    ) -> Result<BookAllocation>;
}

/// Applies every write of one allocation atomically.
///
/// Implementations must apply each debit only if the record still has the
/// slack for it, and fail with `AllocationError::ConcurrentModification`
/// (leaving nothing persisted) otherwise.
#[async_trait]
pub trait AllocationStoreTrait: Send + Sync {
    async fn commit_allocation(&self, commit: AllocationCommit) -> Result<AllocationCommitOutcome>;
}

/// Trait defining the contract for allocation operations.
#[async_trait]
pub trait AllocationServiceTrait: Send + Sync {
    /// Validates, consumes donor inventory oldest first, and records the allocation.
    async fn allocate(&self, request: AllocationRequest) -> Result<BookAllocation>;

    /// Donors with eligible donations in a drive, in order of their oldest donation.
    fn get_donors_with_inventory(&self, drive_id: &str) -> Result<Vec<DonorInventory>>;

    /// Allocations that drew on a donor's donations, with a summary.
    fn get_donor_allocation_history(&self, donor_id: &str) -> Result<DonorAllocationHistory>;

    fn get_drive_inventory(&self, drive_id: &str) -> Result<DriveInventory>;

    fn get_allocations(&self, filter: AllocationFilter) -> Result<Vec<BookAllocation>>;

    /// `delivery_date` is only recorded when moving to `delivered`.
    async fn update_allocation_status(
        &self,
        allocation_id: &str,
        status: AllocationStatus,
        delivery_date: Option<NaiveDateTime>,
    ) -> Result<BookAllocation>;
}
