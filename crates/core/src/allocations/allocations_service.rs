use chrono::NaiveDateTime;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::allocations_errors::{AllocationError, AllocationErrorKind};
use super::allocations_model::{
    AllocationCommit, AllocationCommitOutcome, AllocationFilter, AllocationMode,
    AllocationRequest, AllocationStatus, BookAllocation, DonorAllocationEntry,
    DonorAllocationHistory, DonorAllocationSummary, DonorInventory, DonorTotals, DriveInventory,
    NewBookAllocation,
};
use super::allocations_traits::{
    AllocationRepositoryTrait, AllocationServiceTrait, AllocationStoreTrait,
};
use super::availability::{donor_available, drive_available, lifetime_allocated};
use super::fifo::plan_fifo_consumption;
use super::validator::{validate_allocation, AllocationCheck};
use crate::books::BookCounts;
use crate::donations::{DonationRecord, DonationRepositoryTrait, DonationStatus};
use crate::drives::DriveRepositoryTrait;
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::schools::SchoolRepositoryTrait;
use crate::users::{Badge, UserRepositoryTrait};

/// Async mutexes created on demand per key.
///
/// An entry lives only while some task holds or waits on it.
struct KeyedLocks<K> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    async fn run<F, T>(&self, key: K, work: F) -> T
    where
        F: Future<Output = T>,
    {
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let out = {
            let _guard = lock.lock().await;
            work.await
        };
        drop(lock);
        // Only the map's own handle left means nobody else is waiting.
        self.locks.remove_if(&key, |_, l| Arc::strong_count(l) == 1);
        out
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Service for allocating donated books to schools.
pub struct AllocationService {
    drive_repository: Arc<dyn DriveRepositoryTrait>,
    user_repository: Arc<dyn UserRepositoryTrait>,
    school_repository: Arc<dyn SchoolRepositoryTrait>,
    donation_repository: Arc<dyn DonationRepositoryTrait>,
    allocation_repository: Arc<dyn AllocationRepositoryTrait>,
    allocation_store: Arc<dyn AllocationStoreTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    mode: AllocationMode,
    /// One lock per (donor, drive) pair.
    allocation_locks: KeyedLocks<(String, String)>,
    /// Serializes lifetime total refreshes per donor across drives.
    donor_locks: KeyedLocks<String>,
}

impl AllocationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        drive_repository: Arc<dyn DriveRepositoryTrait>,
        user_repository: Arc<dyn UserRepositoryTrait>,
        school_repository: Arc<dyn SchoolRepositoryTrait>,
        donation_repository: Arc<dyn DonationRepositoryTrait>,
        allocation_repository: Arc<dyn AllocationRepositoryTrait>,
        allocation_store: Arc<dyn AllocationStoreTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        mode: AllocationMode,
    ) -> Self {
        Self {
            drive_repository,
            user_repository,
            school_repository,
            donation_repository,
            allocation_repository,
            allocation_store,
            event_sink,
            mode,
            allocation_locks: KeyedLocks::new(),
            donor_locks: KeyedLocks::new(),
        }
    }

    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    /// Number of per-key locks currently held or awaited.
    #[cfg(test)]
    pub(crate) fn held_lock_count(&self) -> usize {
        self.allocation_locks.len() + self.donor_locks.len()
    }

    async fn allocate_locked(&self, request: &AllocationRequest) -> Result<BookAllocation> {
        let drive = self.drive_repository.find_by_id(&request.drive_id)?;
        let donor = match request.donor_id.as_deref() {
            Some(id) if !id.trim().is_empty() => self.user_repository.find_by_id(id)?,
            _ => None,
        };
        let school = self.school_repository.find_by_id(&request.school_id)?;

        // Always read fresh; nothing about availability is cached.
        let records = match (&drive, &donor) {
            (Some(drive), Some(donor)) => self.donation_repository.list_for_donor_in_drive(
                &donor.id,
                &drive.id,
                &DonationStatus::ALLOCATABLE,
            )?,
            _ => Vec::new(),
        };
        let available = match (&drive, &donor) {
            (Some(drive), Some(donor)) => donor_available(&records, &donor.id, &drive.id),
            _ => Default::default(),
        };

        validate_allocation(&AllocationCheck {
            request,
            drive: drive.as_ref(),
            donor: donor.as_ref(),
            school: school.as_ref(),
            available: &available,
        })?;

        let plan = plan_fifo_consumption(&records, &request.books_allocated)?;

        let commit = AllocationCommit {
            allocation: NewBookAllocation {
                drive_id: request.drive_id.clone(),
                school_id: request.school_id.clone(),
                allocated_by: request.allocated_by.clone(),
                books_allocated: request.books_allocated,
                donations_used: plan.donation_ids(),
                notes: request.notes.clone(),
            },
            debits: plan.debits,
        };
        let donor_ids = commit.donor_ids();

        let outcome = match self.mode {
            AllocationMode::Transactional => self.allocation_store.commit_allocation(commit).await?,
            AllocationMode::Sequential => self.persist_sequentially(commit).await?,
        };

        let allocation = outcome.allocation;
        info!(
            "Allocated {} books from donor(s) {:?} in drive {} to school {} (allocation {})",
            allocation.total_books_allocated,
            donor_ids,
            allocation.drive_id,
            allocation.school_id,
            allocation.id
        );
        self.event_sink.emit(DomainEvent::allocation_created(
            allocation.id.clone(),
            allocation.drive_id.clone(),
            allocation.school_id.clone(),
            donor_ids,
            allocation.total_books_allocated,
        ));
        self.emit_badge_changes(&outcome.donor_totals);

        Ok(allocation)
    }

    /// Writes each step on its own. A failure leaves earlier steps in place;
    /// the donor reconciliation repairs totals afterwards.
    async fn persist_sequentially(
        &self,
        commit: AllocationCommit,
    ) -> Result<AllocationCommitOutcome> {
        let donor_ids = commit.donor_ids();
        let updates = commit
            .debits
            .iter()
            .map(|d| (d.donation_id.clone(), d.allocated_after))
            .collect();
        self.donation_repository
            .update_allocated_counts(updates)
            .await?;

        let mut donor_totals = Vec::with_capacity(donor_ids.len());
        for donor_id in &donor_ids {
            donor_totals.push(self.refresh_donor_totals(donor_id).await?);
        }

        let allocation = self.allocation_repository.create(commit.allocation).await?;
        self.school_repository
            .add_books_received(&allocation.school_id, allocation.total_books_allocated)
            .await?;

        Ok(AllocationCommitOutcome {
            allocation,
            donor_totals,
        })
    }

    /// Recomputes a donor's lifetime allocated total from all of their records.
    async fn refresh_donor_totals(&self, donor_id: &str) -> Result<DonorTotals> {
        self.donor_locks
            .run(donor_id.to_string(), self.refresh_donor_totals_locked(donor_id))
            .await
    }

    async fn refresh_donor_totals_locked(&self, donor_id: &str) -> Result<DonorTotals> {
        let user = self
            .user_repository
            .find_by_id(donor_id)?
            .ok_or_else(|| AllocationError::DonorNotFound(donor_id.to_string()))?;
        let records = self.donation_repository.list_for_donor(donor_id)?;
        let total = lifetime_allocated(&records);
        let badge = Badge::for_total(total);
        self.user_repository
            .update_donation_totals(donor_id, total, badge)
            .await?;
        Ok(DonorTotals {
            user_id: donor_id.to_string(),
            previous_badge: user.badge,
            total_books_donated: total,
            badge,
        })
    }

    fn emit_badge_changes(&self, donor_totals: &[DonorTotals]) {
        for totals in donor_totals {
            if totals.previous_badge != totals.badge {
                debug!(
                    "Donor {} badge {} -> {}",
                    totals.user_id, totals.previous_badge, totals.badge
                );
                self.event_sink.emit(DomainEvent::badge_changed(
                    totals.user_id.clone(),
                    totals.previous_badge,
                    totals.badge,
                ));
            }
        }
    }
}

#[async_trait::async_trait]
impl AllocationServiceTrait for AllocationService {
    async fn allocate(&self, request: AllocationRequest) -> Result<BookAllocation> {
        debug!(
            "Allocation requested: drive={} donor={:?} school={} books={:?}",
            request.drive_id, request.donor_id, request.school_id, request.books_allocated
        );

        let key = (
            request.donor_id.clone().unwrap_or_default(),
            request.drive_id.clone(),
        );
        let result = self
            .allocation_locks
            .run(key, self.allocate_locked(&request))
            .await;

        match result {
            Ok(allocation) => Ok(allocation),
            Err(Error::Allocation(err)) if err.kind() != AllocationErrorKind::Fatal => {
                debug!("Allocation rejected: {}", err);
                Err(err.into())
            }
            Err(err) => {
                error!(
                    "Allocation failed for drive {} donor {:?}: {}",
                    request.drive_id, request.donor_id, err
                );
                Err(err)
            }
        }
    }

    fn get_donors_with_inventory(&self, drive_id: &str) -> Result<Vec<DonorInventory>> {
        let drive = self
            .drive_repository
            .find_by_id(drive_id)?
            .ok_or_else(|| AllocationError::DriveNotFound(drive_id.to_string()))?;
        let records = self
            .donation_repository
            .list_for_drive(&drive.id, &DonationStatus::ALLOCATABLE)?;

        // Group by donor, keeping the order of each donor's oldest record.
        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<DonationRecord>> = HashMap::new();
        for record in records {
            if !grouped.contains_key(&record.donor_id) {
                order.push(record.donor_id.clone());
            }
            grouped
                .entry(record.donor_id.clone())
                .or_default()
                .push(record);
        }

        let mut inventories = Vec::with_capacity(order.len());
        for donor_id in order {
            let donations = grouped.remove(&donor_id).unwrap_or_default();
            let Some(donor) = self.user_repository.find_by_id(&donor_id)? else {
                warn!(
                    "Skipping {} donation(s) in drive {} from unknown donor {}",
                    donations.len(),
                    drive.id,
                    donor_id
                );
                continue;
            };
            let available = donor_available(&donations, &donor_id, &drive.id).clamped();
            inventories.push(DonorInventory {
                donor,
                donations,
                available,
            });
        }
        Ok(inventories)
    }

    fn get_donor_allocation_history(&self, donor_id: &str) -> Result<DonorAllocationHistory> {
        let donation_ids: Vec<String> = self
            .donation_repository
            .list_for_donor(donor_id)?
            .into_iter()
            .map(|r| r.id)
            .collect();
        if donation_ids.is_empty() {
            return Ok(DonorAllocationHistory::default());
        }

        let allocations = self
            .allocation_repository
            .list_using_donations(&donation_ids)?;

        let mut summary = DonorAllocationSummary::default();
        let mut entries = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            summary.total_allocated += allocation.total_books_allocated;
            summary.by_category = summary
                .by_category
                .saturating_add(&allocation.books_allocated);

            let school_name = self
                .school_repository
                .find_by_id(&allocation.school_id)?
                .map(|s| s.name);
            let drive_name = self
                .drive_repository
                .find_by_id(&allocation.drive_id)?
                .map(|d| d.name);
            entries.push(DonorAllocationEntry {
                allocation_id: allocation.id,
                school_id: allocation.school_id,
                school_name,
                drive_id: allocation.drive_id,
                drive_name,
                books_allocated: allocation.books_allocated,
                total_books_allocated: allocation.total_books_allocated,
                allocation_date: allocation.allocation_date,
            });
        }

        Ok(DonorAllocationHistory {
            summary,
            allocations: entries,
        })
    }

    fn get_drive_inventory(&self, drive_id: &str) -> Result<DriveInventory> {
        let drive = self
            .drive_repository
            .find_by_id(drive_id)?
            .ok_or_else(|| AllocationError::DriveNotFound(drive_id.to_string()))?;
        let allocations = self
            .allocation_repository
            .list(&AllocationFilter::Drive(drive.id.clone()))?;

        let books_allocated = allocations
            .iter()
            .fold(BookCounts::ZERO, |acc, a| acc.saturating_add(&a.books_allocated));
        let available = drive_available(&drive, &allocations).clamped();

        Ok(DriveInventory {
            drive_id: drive.id,
            books_received: drive.books_received,
            books_allocated,
            total_available: available.total(),
            available,
        })
    }

    fn get_allocations(&self, filter: AllocationFilter) -> Result<Vec<BookAllocation>> {
        self.allocation_repository.list(&filter)
    }

    async fn update_allocation_status(
        &self,
        allocation_id: &str,
        status: AllocationStatus,
        delivery_date: Option<NaiveDateTime>,
    ) -> Result<BookAllocation> {
        let existing = self
            .allocation_repository
            .find_by_id(allocation_id)?
            .ok_or_else(|| AllocationError::AllocationNotFound(allocation_id.to_string()))?;

        let delivery_date = match (status, delivery_date) {
            (AllocationStatus::Delivered, Some(date)) => Some(date),
            _ => existing.delivery_date,
        };
        self.allocation_repository
            .update_status(allocation_id, status, delivery_date)
            .await
    }
}
