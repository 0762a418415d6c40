//! Pure total-vs-breakdown checks.

use super::consistency_model::{TotalMismatch, TotalMismatchKind};
use crate::allocations::BookAllocation;
use crate::books::BookCounts;
use crate::drives::DonationDrive;

pub fn is_consistent(total: u64, breakdown: &BookCounts) -> bool {
    total == breakdown.total()
}

pub fn check_drive(drive: &DonationDrive) -> Option<TotalMismatch> {
    mismatch(
        TotalMismatchKind::Drive,
        &drive.id,
        drive.total_books_received,
        &drive.books_received,
    )
}

pub fn check_allocation(allocation: &BookAllocation) -> Option<TotalMismatch> {
    mismatch(
        TotalMismatchKind::Allocation,
        &allocation.id,
        allocation.total_books_allocated,
        &allocation.books_allocated,
    )
}

fn mismatch(
    kind: TotalMismatchKind,
    id: &str,
    stored_total: u64,
    breakdown: &BookCounts,
) -> Option<TotalMismatch> {
    if is_consistent(stored_total, breakdown) {
        return None;
    }
    Some(TotalMismatch {
        kind,
        id: id.to_string(),
        stored_total,
        breakdown: *breakdown,
        computed_total: breakdown.total(),
    })
}
