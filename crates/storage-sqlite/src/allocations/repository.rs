use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use bookdrive_core::allocations::{
    AllocationError, AllocationFilter, AllocationRepositoryTrait, AllocationStatus,
    BookAllocation, NewBookAllocation,
};
use bookdrive_core::errors::Result;

use super::model::{AllocationDonationDB, BookAllocationDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{allocation_donations, book_allocations};
use crate::utils::chunk_for_sqlite;

pub struct AllocationRepository {
    pub(super) pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    pub(super) writer: WriteHandle,
}

impl AllocationRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        AllocationRepository { pool, writer }
    }
}

/// Inserts an allocation and its join rows.
pub(super) fn insert_allocation(
    conn: &mut SqliteConnection,
    new_allocation: &NewBookAllocation,
    now: NaiveDateTime,
) -> std::result::Result<BookAllocation, StorageError> {
    let allocation_db =
        BookAllocationDB::from_new(new_allocation, Uuid::new_v4().to_string(), now);
    let result_db = diesel::insert_into(book_allocations::table)
        .values(&allocation_db)
        .returning(BookAllocationDB::as_returning())
        .get_result(conn)?;

    let links = AllocationDonationDB::for_allocation(&result_db.id, &new_allocation.donations_used);
    if !links.is_empty() {
        diesel::insert_into(allocation_donations::table)
            .values(&links)
            .execute(conn)?;
    }
    Ok(result_db.into_domain(new_allocation.donations_used.clone()))
}

/// Attaches `donations_used`, in position order, to loaded allocation rows.
fn with_donations(
    conn: &mut SqliteConnection,
    allocations_db: Vec<BookAllocationDB>,
) -> std::result::Result<Vec<BookAllocation>, StorageError> {
    let ids: Vec<String> = allocations_db.iter().map(|a| a.id.clone()).collect();
    let mut used: HashMap<String, Vec<String>> = HashMap::new();
    for chunk in chunk_for_sqlite(&ids) {
        let links = allocation_donations::table
            .filter(allocation_donations::allocation_id.eq_any(chunk))
            .order((
                allocation_donations::allocation_id.asc(),
                allocation_donations::position.asc(),
            ))
            .select(AllocationDonationDB::as_select())
            .load::<AllocationDonationDB>(conn)?;
        for link in links {
            used.entry(link.allocation_id).or_default().push(link.donation_id);
        }
    }
    Ok(allocations_db
        .into_iter()
        .map(|a| {
            let donations_used = used.remove(&a.id).unwrap_or_default();
            a.into_domain(donations_used)
        })
        .collect())
}

#[async_trait]
impl AllocationRepositoryTrait for AllocationRepository {
    async fn create(&self, new_allocation: NewBookAllocation) -> Result<BookAllocation> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BookAllocation> {
                Ok(insert_allocation(conn, &new_allocation, Utc::now().naive_utc())?)
            })
            .await
    }

    fn find_by_id(&self, allocation_id: &str) -> Result<Option<BookAllocation>> {
        let mut conn = get_connection(&self.pool)?;
        let allocation_db = book_allocations::table
            .find(allocation_id)
            .select(BookAllocationDB::as_select())
            .first::<BookAllocationDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        match allocation_db {
            Some(a) => Ok(with_donations(&mut conn, vec![a])?.pop()),
            None => Ok(None),
        }
    }

    fn list(&self, filter: &AllocationFilter) -> Result<Vec<BookAllocation>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = book_allocations::table
            .select(BookAllocationDB::as_select())
            .order((
                book_allocations::allocation_date.desc(),
                book_allocations::created_at.desc(),
            ))
            .into_boxed();
        match filter {
            AllocationFilter::All => {}
            AllocationFilter::Drive(drive_id) => {
                query = query.filter(book_allocations::drive_id.eq(drive_id.clone()));
            }
            AllocationFilter::School(school_id) => {
                query = query.filter(book_allocations::school_id.eq(school_id.clone()));
            }
        }
        let allocations_db = query
            .load::<BookAllocationDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(with_donations(&mut conn, allocations_db)?)
    }

    fn list_using_donations(&self, donation_ids: &[String]) -> Result<Vec<BookAllocation>> {
        let mut conn = get_connection(&self.pool)?;
        let mut allocation_ids: Vec<String> = Vec::new();
        for chunk in chunk_for_sqlite(donation_ids) {
            let ids = allocation_donations::table
                .filter(allocation_donations::donation_id.eq_any(chunk))
                .select(allocation_donations::allocation_id)
                .distinct()
                .load::<String>(&mut conn)
                .map_err(StorageError::from)?;
            for id in ids {
                if !allocation_ids.contains(&id) {
                    allocation_ids.push(id);
                }
            }
        }

        let mut allocations_db = Vec::with_capacity(allocation_ids.len());
        for chunk in chunk_for_sqlite(&allocation_ids) {
            allocations_db.extend(
                book_allocations::table
                    .filter(book_allocations::id.eq_any(chunk))
                    .select(BookAllocationDB::as_select())
                    .load::<BookAllocationDB>(&mut conn)
                    .map_err(StorageError::from)?,
            );
        }
        allocations_db.sort_by(|a, b| {
            b.allocation_date
                .cmp(&a.allocation_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(with_donations(&mut conn, allocations_db)?)
    }

    async fn update_status(
        &self,
        allocation_id: &str,
        status: AllocationStatus,
        delivery_date: Option<NaiveDateTime>,
    ) -> Result<BookAllocation> {
        let allocation_id = allocation_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BookAllocation> {
                let result_db = diesel::update(book_allocations::table.find(&allocation_id))
                    .set((
                        book_allocations::status.eq(status.as_str()),
                        book_allocations::delivery_date.eq(delivery_date),
                        book_allocations::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .returning(BookAllocationDB::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| AllocationError::AllocationNotFound(allocation_id.clone()))?;
                Ok(with_donations(conn, vec![result_db])?
                    .pop()
                    .ok_or_else(|| AllocationError::AllocationNotFound(allocation_id))?)
            })
            .await
    }
}
