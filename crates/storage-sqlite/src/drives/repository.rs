use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use bookdrive_core::books::BookCounts;
use bookdrive_core::drives::{DonationDrive, DriveRepositoryTrait, DriveStatus, NewDonationDrive};
use bookdrive_core::errors::{Error, Result, ValidationError};

use super::model::DonationDriveDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::donation_drives;
use crate::utils::counts_to_columns;

pub struct DriveRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl DriveRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        DriveRepository { pool, writer }
    }
}

fn drive_not_found(drive_id: &str) -> Error {
    Error::NotFound(format!("Donation drive {}", drive_id))
}

fn received_overflow(drive_id: &str) -> Error {
    ValidationError::InvalidInput(format!(
        "Books received for drive {} would exceed the supported count",
        drive_id
    ))
    .into()
}

/// Writes a received vector and total in one statement.
fn write_books_received(
    conn: &mut SqliteConnection,
    drive_id: &str,
    books: &BookCounts,
    total: u64,
) -> Result<DonationDrive> {
    let [b24, b46, b68, b810] = counts_to_columns(books);
    let result_db = diesel::update(donation_drives::table.find(drive_id))
        .set((
            donation_drives::books_2_4.eq(b24),
            donation_drives::books_4_6.eq(b46),
            donation_drives::books_6_8.eq(b68),
            donation_drives::books_8_10.eq(b810),
            donation_drives::total_books_received.eq(i64::try_from(total).unwrap_or(i64::MAX)),
            donation_drives::updated_at.eq(Utc::now().naive_utc()),
        ))
        .returning(DonationDriveDB::as_returning())
        .get_result(conn)
        .optional()
        .map_err(StorageError::from)?;
    result_db
        .map(DonationDrive::from)
        .ok_or_else(|| drive_not_found(drive_id))
}

#[async_trait]
impl DriveRepositoryTrait for DriveRepository {
    async fn create(&self, new_drive: NewDonationDrive) -> Result<DonationDrive> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<DonationDrive> {
                let id = new_drive
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let drive_db = DonationDriveDB::from_new(new_drive, id, Utc::now().naive_utc());

                let result_db = diesel::insert_into(donation_drives::table)
                    .values(&drive_db)
                    .returning(DonationDriveDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(DonationDrive::from(result_db))
            })
            .await
    }

    fn find_by_id(&self, drive_id: &str) -> Result<Option<DonationDrive>> {
        let mut conn = get_connection(&self.pool)?;
        let drive_db = donation_drives::table
            .find(drive_id)
            .select(DonationDriveDB::as_select())
            .first::<DonationDriveDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(drive_db.map(DonationDrive::from))
    }

    fn list(&self, status_filter: Option<DriveStatus>) -> Result<Vec<DonationDrive>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = donation_drives::table
            .select(DonationDriveDB::as_select())
            .order(donation_drives::created_at.desc())
            .into_boxed();
        if let Some(status) = status_filter {
            query = query.filter(donation_drives::status.eq(status.as_str()));
        }
        let drives_db = query
            .load::<DonationDriveDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(drives_db.into_iter().map(DonationDrive::from).collect())
    }

    async fn add_books_received(
        &self,
        drive_id: &str,
        books: BookCounts,
    ) -> Result<DonationDrive> {
        let drive_id = drive_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<DonationDrive> {
                let current = donation_drives::table
                    .find(&drive_id)
                    .select(DonationDriveDB::as_select())
                    .first::<DonationDriveDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| drive_not_found(&drive_id))?;
                // The total follows the breakdown, not the previous stored total.
                let received = current
                    .books_received()
                    .checked_add(&books)
                    .ok_or_else(|| received_overflow(&drive_id))?;
                write_books_received(conn, &drive_id, &received, received.total())
            })
            .await
    }

    async fn set_books_received(
        &self,
        drive_id: &str,
        books: BookCounts,
        total: u64,
    ) -> Result<DonationDrive> {
        let drive_id = drive_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<DonationDrive> {
                write_books_received(conn, &drive_id, &books, total)
            })
            .await
    }
}
