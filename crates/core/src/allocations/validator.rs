//! Pre-flight checks for an allocation request.

use super::allocations_errors::{AllocationError, CategoryShortfall};
use super::allocations_model::AllocationRequest;
use crate::books::{BookCounts, CategoryBalance};
use crate::drives::DonationDrive;
use crate::schools::School;
use crate::users::User;

/// What the validator needs to know about one request. Lookups are done by the
/// caller; `None` means the entity was not found.
#[derive(Debug, Clone, Copy)]
pub struct AllocationCheck<'a> {
    pub request: &'a AllocationRequest,
    pub drive: Option<&'a DonationDrive>,
    pub donor: Option<&'a User>,
    pub school: Option<&'a School>,
    /// Donor-in-drive balance for the requested donor.
    pub available: &'a CategoryBalance,
}

/// Runs the checks in order. The first structural failure wins; category
/// shortfalls are collected and reported together.
pub fn validate_allocation(check: &AllocationCheck<'_>) -> Result<(), AllocationError> {
    let request = check.request;
    if check.drive.is_none() {
        return Err(AllocationError::DriveNotFound(request.drive_id.clone()));
    }
    let donor_id = match request.donor_id.as_deref() {
        Some(id) if !id.trim().is_empty() => id,
        _ => return Err(AllocationError::DonorRequired),
    };
    if check.donor.is_none() {
        return Err(AllocationError::DonorNotFound(donor_id.to_string()));
    }
    if check.school.is_none() {
        return Err(AllocationError::SchoolNotFound(request.school_id.clone()));
    }
    if request.books_allocated.is_empty() {
        return Err(AllocationError::EmptyAllocation);
    }

    let shortfalls = category_shortfalls(&request.books_allocated, check.available);
    if !shortfalls.is_empty() {
        return Err(AllocationError::CategoryInsufficient(shortfalls));
    }
    Ok(())
}

/// Every category where `requested` exceeds `available`, in category order.
pub fn category_shortfalls(
    requested: &BookCounts,
    available: &CategoryBalance,
) -> Vec<CategoryShortfall> {
    requested
        .iter()
        .filter(|(category, n)| i64::from(*n) > available.get(*category))
        .map(|(category, n)| CategoryShortfall {
            category,
            available: available.get(category),
            requested: n,
        })
        .collect()
}
