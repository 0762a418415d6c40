use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sql_types::BigInt;
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use bookdrive_core::allocations::DonationDebit;
use bookdrive_core::books::BookCounts;
use bookdrive_core::donations::{
    DonationRecord, DonationRepositoryTrait, DonationStatus, NewDonationRecord,
};
use bookdrive_core::errors::{Error, Result};

use super::model::DonationRecordDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::donation_records;
use crate::utils::{counts_from_columns, counts_to_columns};

pub struct DonationRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl DonationRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        DonationRepository { pool, writer }
    }

    /// Oldest first: donation date, then insertion order.
    fn load_oldest_first(
        &self,
        donor_id: Option<&str>,
        drive_id: &str,
        statuses: &[DonationStatus],
    ) -> Result<Vec<DonationRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = donation_records::table
            .select(DonationRecordDB::as_select())
            .filter(donation_records::drive_id.eq(drive_id))
            .order((
                donation_records::donation_date.asc(),
                donation_records::created_at.asc(),
            ))
            .then_order_by(sql::<BigInt>("donation_records.rowid"))
            .into_boxed();
        if let Some(donor_id) = donor_id {
            query = query.filter(donation_records::donor_id.eq(donor_id));
        }
        if !statuses.is_empty() {
            let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
            query = query.filter(donation_records::status.eq_any(statuses));
        }
        let records_db = query
            .load::<DonationRecordDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(records_db.into_iter().map(DonationRecord::from).collect())
    }
}

fn donation_not_found(donation_id: &str) -> Error {
    Error::NotFound(format!("Donation {}", donation_id))
}

/// Adds `debit.debit` to a record's allocated counts only while every
/// category stays within the pledged count.
///
/// Returns the number of rows updated: 1 when applied, 0 when the record is
/// missing or no longer has the slack.
pub(crate) fn apply_guarded_debit(
    conn: &mut SqliteConnection,
    debit: &DonationDebit,
    now: NaiveDateTime,
) -> std::result::Result<usize, StorageError> {
    let [d24, d46, d68, d810] = counts_to_columns(&debit.debit);
    let rows = diesel::update(
        donation_records::table
            .filter(donation_records::id.eq(&debit.donation_id))
            .filter((donation_records::allocated_2_4 + d24).le(donation_records::books_2_4))
            .filter((donation_records::allocated_4_6 + d46).le(donation_records::books_4_6))
            .filter((donation_records::allocated_6_8 + d68).le(donation_records::books_6_8))
            .filter((donation_records::allocated_8_10 + d810).le(donation_records::books_8_10)),
    )
    .set((
        donation_records::allocated_2_4.eq(donation_records::allocated_2_4 + d24),
        donation_records::allocated_4_6.eq(donation_records::allocated_4_6 + d46),
        donation_records::allocated_6_8.eq(donation_records::allocated_6_8 + d68),
        donation_records::allocated_8_10.eq(donation_records::allocated_8_10 + d810),
        donation_records::updated_at.eq(now),
    ))
    .execute(conn)?;
    Ok(rows)
}

/// A donor's lifetime allocated books across every drive.
pub(crate) fn lifetime_allocated_for_donor(
    conn: &mut SqliteConnection,
    donor: &str,
) -> std::result::Result<u64, StorageError> {
    let rows = donation_records::table
        .filter(donation_records::donor_id.eq(donor))
        .select((
            donation_records::allocated_2_4,
            donation_records::allocated_4_6,
            donation_records::allocated_6_8,
            donation_records::allocated_8_10,
        ))
        .load::<(i64, i64, i64, i64)>(conn)?;
    Ok(rows
        .into_iter()
        .map(|(a, b, c, d)| counts_from_columns(a, b, c, d).total())
        .sum())
}

#[async_trait]
impl DonationRepositoryTrait for DonationRepository {
    async fn create(&self, new_donation: NewDonationRecord) -> Result<DonationRecord> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<DonationRecord> {
                let id = new_donation
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let record_db =
                    DonationRecordDB::from_new(new_donation, id, Utc::now().naive_utc());

                let result_db = diesel::insert_into(donation_records::table)
                    .values(&record_db)
                    .returning(DonationRecordDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(DonationRecord::from(result_db))
            })
            .await
    }

    fn find_by_id(&self, donation_id: &str) -> Result<Option<DonationRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let record_db = donation_records::table
            .find(donation_id)
            .select(DonationRecordDB::as_select())
            .first::<DonationRecordDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(record_db.map(DonationRecord::from))
    }

    fn list_for_donor_in_drive(
        &self,
        donor_id: &str,
        drive_id: &str,
        statuses: &[DonationStatus],
    ) -> Result<Vec<DonationRecord>> {
        self.load_oldest_first(Some(donor_id), drive_id, statuses)
    }

    fn list_for_drive(
        &self,
        drive_id: &str,
        statuses: &[DonationStatus],
    ) -> Result<Vec<DonationRecord>> {
        self.load_oldest_first(None, drive_id, statuses)
    }

    fn list_for_donor(&self, donor_id: &str) -> Result<Vec<DonationRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let records_db = donation_records::table
            .select(DonationRecordDB::as_select())
            .filter(donation_records::donor_id.eq(donor_id))
            .order((
                donation_records::donation_date.desc(),
                donation_records::created_at.desc(),
            ))
            .load::<DonationRecordDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(records_db.into_iter().map(DonationRecord::from).collect())
    }

    fn list_all(&self) -> Result<Vec<DonationRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let records_db = donation_records::table
            .select(DonationRecordDB::as_select())
            .order((
                donation_records::donation_date.desc(),
                donation_records::created_at.desc(),
            ))
            .load::<DonationRecordDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(records_db.into_iter().map(DonationRecord::from).collect())
    }

    async fn update_allocated_counts(&self, updates: Vec<(String, BookCounts)>) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let now = Utc::now().naive_utc();
                for (donation_id, allocated) in updates {
                    let [a24, a46, a68, a810] = counts_to_columns(&allocated);
                    let rows = diesel::update(donation_records::table.find(&donation_id))
                        .set((
                            donation_records::allocated_2_4.eq(a24),
                            donation_records::allocated_4_6.eq(a46),
                            donation_records::allocated_6_8.eq(a68),
                            donation_records::allocated_8_10.eq(a810),
                            donation_records::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    if rows == 0 {
                        return Err(donation_not_found(&donation_id));
                    }
                }
                Ok(())
            })
            .await
    }

    async fn update_status(
        &self,
        donation_id: &str,
        status: DonationStatus,
        collected_at: Option<NaiveDateTime>,
    ) -> Result<DonationRecord> {
        let donation_id = donation_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<DonationRecord> {
                let result_db = diesel::update(donation_records::table.find(&donation_id))
                    .set((
                        donation_records::status.eq(status.as_str()),
                        collected_at.map(|at| donation_records::collected_at.eq(Some(at))),
                        donation_records::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .returning(DonationRecordDB::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                result_db
                    .map(DonationRecord::from)
                    .ok_or_else(|| donation_not_found(&donation_id))
            })
            .await
    }
}
