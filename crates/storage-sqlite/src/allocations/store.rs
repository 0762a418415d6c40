use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;

use bookdrive_core::allocations::{
    AllocationCommit, AllocationCommitOutcome, AllocationError, AllocationStoreTrait, DonorTotals,
};
use bookdrive_core::errors::Result;
use bookdrive_core::users::Badge;

use super::repository::{insert_allocation, AllocationRepository};
use crate::donations::{apply_guarded_debit, lifetime_allocated_for_donor};
use crate::errors::StorageError;
use crate::schema::users;
use crate::schools::increment_books_received;

#[async_trait]
impl AllocationStoreTrait for AllocationRepository {
    /// Runs every write of one allocation as a single writer job.
    ///
    /// Any error returned from the job rolls the whole transaction back.
    async fn commit_allocation(&self, commit: AllocationCommit) -> Result<AllocationCommitOutcome> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<AllocationCommitOutcome> {
                let now = Utc::now().naive_utc();

                for debit in &commit.debits {
                    if apply_guarded_debit(conn, debit, now)? != 1 {
                        return Err(AllocationError::ConcurrentModification {
                            donation_id: debit.donation_id.clone(),
                        }
                        .into());
                    }
                }

                let mut donor_totals = Vec::new();
                for donor_id in commit.donor_ids() {
                    let previous: Option<String> = users::table
                        .find(&donor_id)
                        .select(users::badge)
                        .first::<String>(conn)
                        .optional()
                        .map_err(StorageError::from)?;
                    let previous_badge: Badge = previous
                        .ok_or_else(|| AllocationError::DonorNotFound(donor_id.clone()))?
                        .parse()
                        .unwrap_or_default();

                    let total = lifetime_allocated_for_donor(conn, &donor_id)?;
                    let badge = Badge::for_total(total);
                    diesel::update(users::table.find(&donor_id))
                        .set((
                            users::total_books_donated.eq(i64::try_from(total).unwrap_or(i64::MAX)),
                            users::badge.eq(badge.as_str()),
                            users::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    debug!("Donor {} lifetime total is now {}", donor_id, total);

                    donor_totals.push(DonorTotals {
                        user_id: donor_id,
                        previous_badge,
                        total_books_donated: total,
                        badge,
                    });
                }

                let total_books = commit.allocation.total_books_allocated();
                if increment_books_received(conn, &commit.allocation.school_id, total_books, now)?
                    != 1
                {
                    return Err(
                        AllocationError::SchoolNotFound(commit.allocation.school_id.clone()).into(),
                    );
                }

                let allocation = insert_allocation(conn, &commit.allocation, now)?;
                Ok(AllocationCommitOutcome {
                    allocation,
                    donor_totals,
                })
            })
            .await
    }
}
