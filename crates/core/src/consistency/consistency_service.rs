use log::{debug, info, warn};
use std::sync::Arc;

use super::consistency_checker::{check_allocation, check_drive};
use super::consistency_model::{ConsistencyReport, OverAllocatedDonation};
use super::consistency_traits::ConsistencyServiceTrait;
use crate::allocations::{lifetime_allocated, AllocationFilter, AllocationRepositoryTrait};
use crate::books::BookCounts;
use crate::donations::DonationRepositoryTrait;
use crate::drives::DriveRepositoryTrait;
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::users::{Badge, UserRepositoryTrait};

/// Repairs denormalized totals from raw donation records.
pub struct ConsistencyService {
    drive_repository: Arc<dyn DriveRepositoryTrait>,
    user_repository: Arc<dyn UserRepositoryTrait>,
    donation_repository: Arc<dyn DonationRepositoryTrait>,
    allocation_repository: Arc<dyn AllocationRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl ConsistencyService {
    pub fn new(
        drive_repository: Arc<dyn DriveRepositoryTrait>,
        user_repository: Arc<dyn UserRepositoryTrait>,
        donation_repository: Arc<dyn DonationRepositoryTrait>,
        allocation_repository: Arc<dyn AllocationRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            drive_repository,
            user_repository,
            donation_repository,
            allocation_repository,
            event_sink,
        }
    }
}

#[async_trait::async_trait]
impl ConsistencyServiceTrait for ConsistencyService {
    async fn recalculate_drive_totals(&self) -> Result<usize> {
        let drives = self.drive_repository.list(None)?;
        let mut updated = Vec::with_capacity(drives.len());

        for drive in drives {
            // Allocations are ignored: received counts what was donated.
            let received = self
                .donation_repository
                .list_for_drive(&drive.id, &[])?
                .iter()
                .fold(BookCounts::ZERO, |acc, r| acc.saturating_add(&r.books_count));
            let total = received.total();

            if check_drive(&drive).is_some() || drive.books_received != received {
                debug!(
                    "Drive {} totals {} -> {}",
                    drive.id, drive.total_books_received, total
                );
            }
            self.drive_repository
                .set_books_received(&drive.id, received, total)
                .await?;
            updated.push(drive.id);
        }

        info!("Recalculated totals for {} drive(s)", updated.len());
        let count = updated.len();
        self.event_sink
            .emit(DomainEvent::drive_totals_recalculated(updated));
        Ok(count)
    }

    async fn reconcile_donor_totals(&self) -> Result<usize> {
        let mut changed = 0;
        for user in self.user_repository.list()? {
            let records = self.donation_repository.list_for_donor(&user.id)?;
            let total = lifetime_allocated(&records);
            let badge = Badge::for_total(total);
            if total == user.total_books_donated && badge == user.badge {
                continue;
            }

            warn!(
                "Donor {} stored total {} ({}) differs from records: {} ({})",
                user.id, user.total_books_donated, user.badge, total, badge
            );
            self.user_repository
                .update_donation_totals(&user.id, total, badge)
                .await?;
            if badge != user.badge {
                self.event_sink
                    .emit(DomainEvent::badge_changed(user.id.clone(), user.badge, badge));
            }
            changed += 1;
        }
        info!("Reconciled donor totals, {} user(s) changed", changed);
        Ok(changed)
    }

    fn audit(&self) -> Result<ConsistencyReport> {
        let drives = self
            .drive_repository
            .list(None)?
            .iter()
            .filter_map(check_drive)
            .collect();
        let allocations = self
            .allocation_repository
            .list(&AllocationFilter::All)?
            .iter()
            .filter_map(check_allocation)
            .collect();
        let over_allocated_donations = self
            .donation_repository
            .list_all()?
            .into_iter()
            .filter(|r| r.is_over_allocated())
            .map(|r| OverAllocatedDonation {
                donation_id: r.id,
                donor_id: r.donor_id,
                drive_id: r.drive_id,
                books_count: r.books_count,
                allocated_count: r.allocated_count,
            })
            .collect();

        Ok(ConsistencyReport {
            drives,
            allocations,
            over_allocated_donations,
        })
    }
}
