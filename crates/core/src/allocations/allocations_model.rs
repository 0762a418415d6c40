//! Allocation domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::books::BookCounts;
use crate::donations::DonationRecord;
use crate::users::{Badge, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    #[default]
    Allocated,
    Delivered,
    Confirmed,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Allocated => "allocated",
            AllocationStatus::Delivered => "delivered",
            AllocationStatus::Confirmed => "confirmed",
        }
    }
}

impl FromStr for AllocationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "allocated" => Ok(AllocationStatus::Allocated),
            "delivered" => Ok(AllocationStatus::Delivered),
            "confirmed" => Ok(AllocationStatus::Confirmed),
            _ => Err(format!("Unknown allocation status: {}", s)),
        }
    }
}

/// How the aggregate updates of an allocation reach storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMode {
    /// One write per step. A failure part way leaves earlier steps persisted.
    Sequential,
    /// All steps in one storage transaction.
    #[default]
    Transactional,
}

impl FromStr for AllocationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(AllocationMode::Sequential),
            "transactional" => Ok(AllocationMode::Transactional),
            other => Err(format!("Unknown allocation mode: {}", other)),
        }
    }
}

/// A single act of moving books from donations in one drive to one school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAllocation {
    pub id: String,
    pub drive_id: String,
    pub school_id: String,
    pub allocated_by: String,
    pub books_allocated: BookCounts,
    pub total_books_allocated: u64,
    /// Donation records debited by this allocation, in first-touched order.
    pub donations_used: Vec<String>,
    pub status: AllocationStatus,
    pub allocation_date: NaiveDateTime,
    pub delivery_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Repository input for a new allocation. The total is derived from `books_allocated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookAllocation {
    pub drive_id: String,
    pub school_id: String,
    pub allocated_by: String,
    pub books_allocated: BookCounts,
    pub donations_used: Vec<String>,
    pub notes: Option<String>,
}

impl NewBookAllocation {
    pub fn total_books_allocated(&self) -> u64 {
        self.books_allocated.total()
    }
}

/// An administrator's request to allocate books from one donor's donations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub drive_id: String,
    pub donor_id: Option<String>,
    pub school_id: String,
    pub books_allocated: BookCounts,
    pub notes: Option<String>,
    pub allocated_by: String,
}

/// What FIFO consumption takes from one donation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationDebit {
    pub donation_id: String,
    pub donor_id: String,
    /// Units taken from the record by this allocation.
    pub debit: BookCounts,
    /// The record's `allocated_count` once the debit is applied.
    pub allocated_after: BookCounts,
}

/// Everything the aggregate updater has to persist for one allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationCommit {
    pub allocation: NewBookAllocation,
    pub debits: Vec<DonationDebit>,
}

impl AllocationCommit {
    /// Distinct donors whose records were debited, in first-touched order.
    pub fn donor_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for debit in &self.debits {
            if !ids.contains(&debit.donor_id) {
                ids.push(debit.donor_id.clone());
            }
        }
        ids
    }
}

/// A donor's refreshed lifetime totals after an allocation or reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorTotals {
    pub user_id: String,
    pub previous_badge: Badge,
    pub total_books_donated: u64,
    pub badge: Badge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationCommitOutcome {
    pub allocation: BookAllocation,
    pub donor_totals: Vec<DonorTotals>,
}

/// A donor's eligible donations in a drive and what is left of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorInventory {
    pub donor: User,
    pub donations: Vec<DonationRecord>,
    pub available: BookCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorAllocationEntry {
    pub allocation_id: String,
    pub school_id: String,
    pub school_name: Option<String>,
    pub drive_id: String,
    pub drive_name: Option<String>,
    pub books_allocated: BookCounts,
    pub total_books_allocated: u64,
    pub allocation_date: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorAllocationSummary {
    pub total_allocated: u64,
    pub by_category: BookCounts,
}

/// Where a donor's books ended up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorAllocationHistory {
    pub summary: DonorAllocationSummary,
    pub allocations: Vec<DonorAllocationEntry>,
}

/// Drive-wide received/allocated/available view, for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveInventory {
    pub drive_id: String,
    pub books_received: BookCounts,
    pub books_allocated: BookCounts,
    pub available: BookCounts,
    pub total_available: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllocationFilter {
    #[default]
    All,
    Drive(String),
    School(String),
}
