//! Database models for donation drives.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use bookdrive_core::books::BookCounts;
use bookdrive_core::drives::{ContactInfo, DonationDrive, DriveStatus, NewDonationDrive};

use crate::utils::{counts_from_columns, to_u64};

/// Database model for donation drives
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
#[diesel(table_name = crate::schema::donation_drives)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct DonationDriveDB {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub gated_community: String,
    pub coordinator_name: Option<String>,
    pub coordinator_phone: Option<String>,
    pub coordinator_email: Option<String>,
    pub administrator_id: String,
    pub status: String,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub instructions: Option<String>,
    pub books_2_4: i64,
    pub books_4_6: i64,
    pub books_6_8: i64,
    pub books_8_10: i64,
    pub total_books_received: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl DonationDriveDB {
    pub fn from_new(new_drive: NewDonationDrive, id: String, now: NaiveDateTime) -> Self {
        Self {
            id,
            name: new_drive.name,
            description: new_drive.description,
            location: new_drive.location,
            gated_community: new_drive.gated_community,
            coordinator_name: new_drive.coordinator.name,
            coordinator_phone: new_drive.coordinator.phone,
            coordinator_email: new_drive.coordinator.email,
            administrator_id: new_drive.administrator_id,
            status: DriveStatus::Active.as_str().to_string(),
            start_date: new_drive.start_date,
            end_date: new_drive.end_date,
            instructions: new_drive.instructions,
            books_2_4: 0,
            books_4_6: 0,
            books_6_8: 0,
            books_8_10: 0,
            total_books_received: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn books_received(&self) -> BookCounts {
        counts_from_columns(self.books_2_4, self.books_4_6, self.books_6_8, self.books_8_10)
    }
}

impl From<DonationDriveDB> for DonationDrive {
    fn from(db: DonationDriveDB) -> Self {
        let books_received = db.books_received();
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            location: db.location,
            gated_community: db.gated_community,
            coordinator: ContactInfo {
                name: db.coordinator_name,
                phone: db.coordinator_phone,
                email: db.coordinator_email,
            },
            administrator_id: db.administrator_id,
            status: db.status.parse().unwrap_or_default(),
            start_date: db.start_date,
            end_date: db.end_date,
            instructions: db.instructions,
            books_received,
            total_books_received: to_u64(db.total_books_received),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
