//! Database models for book allocations.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use bookdrive_core::allocations::{AllocationStatus, BookAllocation, NewBookAllocation};

use crate::utils::{counts_from_columns, counts_to_columns, to_u64};

/// Database model for book allocations
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::book_allocations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct BookAllocationDB {
    pub id: String,
    pub drive_id: String,
    pub school_id: String,
    pub allocated_by: String,
    pub books_2_4: i64,
    pub books_4_6: i64,
    pub books_6_8: i64,
    pub books_8_10: i64,
    pub total_books_allocated: i64,
    pub status: String,
    pub allocation_date: NaiveDateTime,
    pub delivery_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Join row linking an allocation to a donation it drew from.
#[derive(
    Insertable,
    Queryable,
    Associations,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(belongs_to(BookAllocationDB, foreign_key = allocation_id))]
#[diesel(table_name = crate::schema::allocation_donations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct AllocationDonationDB {
    pub allocation_id: String,
    pub donation_id: String,
    /// First-touched order within the allocation.
    pub position: i32,
}

impl BookAllocationDB {
    pub fn from_new(new_allocation: &NewBookAllocation, id: String, now: NaiveDateTime) -> Self {
        let [b24, b46, b68, b810] = counts_to_columns(&new_allocation.books_allocated);
        Self {
            id,
            drive_id: new_allocation.drive_id.clone(),
            school_id: new_allocation.school_id.clone(),
            allocated_by: new_allocation.allocated_by.clone(),
            books_2_4: b24,
            books_4_6: b46,
            books_6_8: b68,
            books_8_10: b810,
            total_books_allocated: i64::try_from(new_allocation.total_books_allocated())
                .unwrap_or(i64::MAX),
            status: AllocationStatus::Allocated.as_str().to_string(),
            allocation_date: now,
            delivery_date: None,
            notes: new_allocation.notes.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds the domain allocation. `donations_used` must already be in position order.
    pub fn into_domain(self, donations_used: Vec<String>) -> BookAllocation {
        BookAllocation {
            books_allocated: counts_from_columns(
                self.books_2_4,
                self.books_4_6,
                self.books_6_8,
                self.books_8_10,
            ),
            id: self.id,
            drive_id: self.drive_id,
            school_id: self.school_id,
            allocated_by: self.allocated_by,
            total_books_allocated: to_u64(self.total_books_allocated),
            donations_used,
            status: self.status.parse().unwrap_or_default(),
            allocation_date: self.allocation_date,
            delivery_date: self.delivery_date,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl AllocationDonationDB {
    pub fn for_allocation(allocation_id: &str, donations_used: &[String]) -> Vec<Self> {
        donations_used
            .iter()
            .enumerate()
            .map(|(position, donation_id)| Self {
                allocation_id: allocation_id.to_string(),
                donation_id: donation_id.clone(),
                position: i32::try_from(position).unwrap_or(i32::MAX),
            })
            .collect()
    }
}
