//! Database models for donation records.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use bookdrive_core::donations::{DonationRecord, DonationStatus, NewDonationRecord};

use crate::utils::{counts_from_columns, counts_to_columns, to_u64};

/// Database model for donation records
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
#[diesel(table_name = crate::schema::donation_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct DonationRecordDB {
    pub id: String,
    pub donor_id: String,
    pub drive_id: String,
    pub donation_date: NaiveDateTime,
    pub books_2_4: i64,
    pub books_4_6: i64,
    pub books_6_8: i64,
    pub books_8_10: i64,
    pub allocated_2_4: i64,
    pub allocated_4_6: i64,
    pub allocated_6_8: i64,
    pub allocated_8_10: i64,
    pub total_books: i64,
    pub status: String,
    pub collected_at: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl DonationRecordDB {
    pub fn from_new(new_donation: NewDonationRecord, id: String, now: NaiveDateTime) -> Self {
        let [b24, b46, b68, b810] = counts_to_columns(&new_donation.books_count);
        Self {
            id,
            donor_id: new_donation.donor_id,
            drive_id: new_donation.drive_id,
            donation_date: new_donation.donation_date,
            books_2_4: b24,
            books_4_6: b46,
            books_6_8: b68,
            books_8_10: b810,
            allocated_2_4: 0,
            allocated_4_6: 0,
            allocated_6_8: 0,
            allocated_8_10: 0,
            total_books: i64::try_from(new_donation.books_count.total()).unwrap_or(i64::MAX),
            status: DonationStatus::Submitted.as_str().to_string(),
            collected_at: None,
            notes: new_donation.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<DonationRecordDB> for DonationRecord {
    fn from(db: DonationRecordDB) -> Self {
        Self {
            books_count: counts_from_columns(db.books_2_4, db.books_4_6, db.books_6_8, db.books_8_10),
            allocated_count: counts_from_columns(
                db.allocated_2_4,
                db.allocated_4_6,
                db.allocated_6_8,
                db.allocated_8_10,
            ),
            id: db.id,
            donor_id: db.donor_id,
            drive_id: db.drive_id,
            donation_date: db.donation_date,
            total_books: to_u64(db.total_books),
            status: db.status.parse().unwrap_or_default(),
            collected_at: db.collected_at,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
