//! Inventory derived from raw donation and allocation records.

use super::allocations_model::BookAllocation;
use crate::books::CategoryBalance;
use crate::donations::DonationRecord;
use crate::drives::DonationDrive;

/// Books a donor still has to give in a drive.
///
/// Only the donor's records in `drive_id` with an allocatable status count.
/// The balance is signed; use [`CategoryBalance::clamped`] for display.
pub fn donor_available(
    records: &[DonationRecord],
    donor_id: &str,
    drive_id: &str,
) -> CategoryBalance {
    let mut available = CategoryBalance::default();
    for record in records.iter().filter(|r| {
        r.donor_id == donor_id && r.drive_id == drive_id && r.status.is_allocatable()
    }) {
        available.add_counts(&record.books_count);
        available.sub_counts(&record.allocated_count);
    }
    available
}

/// Drive-wide balance: everything received minus everything allocated from it.
pub fn drive_available(drive: &DonationDrive, allocations: &[BookAllocation]) -> CategoryBalance {
    let mut available = CategoryBalance::from_counts(&drive.books_received);
    for allocation in allocations.iter().filter(|a| a.drive_id == drive.id) {
        available.sub_counts(&allocation.books_allocated);
    }
    available
}

/// Lifetime books allocated from a donor's records, across every drive.
pub fn lifetime_allocated(records: &[DonationRecord]) -> u64 {
    records.iter().map(DonationRecord::total_allocated).sum()
}
