use serde::{Deserialize, Serialize};

use crate::books::BookCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalMismatchKind {
    Drive,
    Allocation,
}

/// A stored total that disagrees with the sum of its breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalMismatch {
    pub kind: TotalMismatchKind,
    pub id: String,
    pub stored_total: u64,
    pub breakdown: BookCounts,
    pub computed_total: u64,
}

/// A donation record with more allocated than pledged in some category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverAllocatedDonation {
    pub donation_id: String,
    pub donor_id: String,
    pub drive_id: String,
    pub books_count: BookCounts,
    pub allocated_count: BookCounts,
}

/// Read-only audit result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub drives: Vec<TotalMismatch>,
    pub allocations: Vec<TotalMismatch>,
    pub over_allocated_donations: Vec<OverAllocatedDonation>,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.drives.is_empty()
            && self.allocations.is_empty()
            && self.over_allocated_donations.is_empty()
    }
}
