use serde::Serialize;
use thiserror::Error;

use crate::books::AgeCategory;

/// One category where a request asks for more than the donor has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShortfall {
    pub category: AgeCategory,
    pub available: i64,
    pub requested: u32,
}

/// How a caller should treat an [`AllocationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationErrorKind {
    /// Missing or unknown ids. Nothing was changed.
    Structural,
    /// The request conflicts with current inventory. Nothing was changed.
    Validation,
    /// The engine broke one of its own invariants. Do not retry blindly.
    Fatal,
}

/// Errors raised by the allocation engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Donation drive not found")]
    DriveNotFound(String),

    #[error("Donor must be selected for allocation")]
    DonorRequired,

    #[error("Donor not found")]
    DonorNotFound(String),

    #[error("School not found")]
    SchoolNotFound(String),

    #[error("Allocation not found")]
    AllocationNotFound(String),

    #[error("At least one book must be allocated")]
    EmptyAllocation,

    #[error("{}", describe_shortfalls(.0))]
    CategoryInsufficient(Vec<CategoryShortfall>),

    #[error("Donation records could not cover approved demand in category {category} ({unmet} books unmet)")]
    InventoryShortfall { category: AgeCategory, unmet: u32 },

    #[error("Donation {donation_id} was changed by a concurrent allocation")]
    ConcurrentModification { donation_id: String },
}

impl AllocationError {
    pub fn kind(&self) -> AllocationErrorKind {
        match self {
            AllocationError::DriveNotFound(_)
            | AllocationError::DonorRequired
            | AllocationError::DonorNotFound(_)
            | AllocationError::SchoolNotFound(_)
            | AllocationError::AllocationNotFound(_) => AllocationErrorKind::Structural,
            AllocationError::EmptyAllocation | AllocationError::CategoryInsufficient(_) => {
                AllocationErrorKind::Validation
            }
            AllocationError::InventoryShortfall { .. }
            | AllocationError::ConcurrentModification { .. } => AllocationErrorKind::Fatal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AllocationError::DriveNotFound(_)
                | AllocationError::DonorNotFound(_)
                | AllocationError::SchoolNotFound(_)
                | AllocationError::AllocationNotFound(_)
        )
    }
}

fn describe_shortfalls(shortfalls: &[CategoryShortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| {
            format!(
                "Not enough books from this donor in category {}. Available: {}, Requested: {}",
                s.category,
                s.available.max(0),
                s.requested
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}
