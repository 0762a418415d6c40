//! Unit tests for the allocation service.

use super::*;
use crate::books::{AgeCategory, BookCounts};
use crate::donations::{DonationRecord, DonationRepositoryTrait, DonationStatus, NewDonationRecord};
use crate::drives::{
    ContactInfo, DonationDrive, DriveRepositoryTrait, DriveStatus, NewDonationDrive,
};
use crate::errors::{DatabaseError, Error, Result};
use crate::events::{DomainEvent, MockDomainEventSink};
use crate::schools::{Address, NewSchool, School, SchoolRepositoryTrait, SchoolType};
use crate::users::{Badge, NewUser, User, UserRepositoryTrait, UserRole};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Clone, Default)]
struct State {
    users: HashMap<String, User>,
    drives: HashMap<String, DonationDrive>,
    schools: HashMap<String, School>,
    /// Insertion order doubles as creation order.
    donations: Vec<DonationRecord>,
    allocations: Vec<BookAllocation>,
}

/// Implements every repository plus the transactional store over one shared state.
#[derive(Default)]
struct InMemoryStore {
    state: RwLock<State>,
    fail_allocation_create: AtomicBool,
    next_id: AtomicU64,
}

impl InMemoryStore {
    fn snapshot(&self) -> State {
        self.state.read().unwrap().clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", prefix, n)
    }

    fn donation(&self, id: &str) -> DonationRecord {
        self.snapshot()
            .donations
            .into_iter()
            .find(|d| d.id == id)
            .unwrap()
    }

    fn user(&self, id: &str) -> User {
        self.snapshot().users.get(id).cloned().unwrap()
    }

    fn school(&self, id: &str) -> School {
        self.snapshot().schools.get(id).cloned().unwrap()
    }

    fn insert_allocation(&self, state: &mut State, new: NewBookAllocation) -> Result<BookAllocation> {
        if self.fail_allocation_create.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryFailed("injected allocation insert failure".to_string()).into());
        }
        let now = base_time() + Duration::hours(state.allocations.len() as i64 + 1);
        let allocation = BookAllocation {
            id: self.next_id("alloc"),
            total_books_allocated: new.total_books_allocated(),
            drive_id: new.drive_id,
            school_id: new.school_id,
            allocated_by: new.allocated_by,
            books_allocated: new.books_allocated,
            donations_used: new.donations_used,
            status: AllocationStatus::Allocated,
            allocation_date: now,
            delivery_date: None,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        state.allocations.push(allocation.clone());
        Ok(allocation)
    }
}

fn donor_totals_in(state: &mut State, donor_id: &str) -> Result<DonorTotals> {
    let total = lifetime_allocated(
        &state
            .donations
            .iter()
            .filter(|d| d.donor_id == donor_id)
            .cloned()
            .collect::<Vec<_>>(),
    );
    let user = state
        .users
        .get_mut(donor_id)
        .ok_or_else(|| Error::NotFound(donor_id.to_string()))?;
    let previous_badge = user.badge;
    user.total_books_donated = total;
    user.badge = Badge::for_total(total);
    Ok(DonorTotals {
        user_id: donor_id.to_string(),
        previous_badge,
        total_books_donated: total,
        badge: user.badge,
    })
}

#[async_trait]
impl UserRepositoryTrait for InMemoryStore {
    async fn create(&self, _new_user: NewUser) -> Result<User> {
        unimplemented!()
    }

    fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.state.read().unwrap().users.get(user_id).cloned())
    }

    fn list(&self) -> Result<Vec<User>> {
        Ok(self.state.read().unwrap().users.values().cloned().collect())
    }

    async fn update_donation_totals(
        &self,
        user_id: &str,
        total_books_donated: u64,
        badge: Badge,
    ) -> Result<User> {
        let mut state = self.state.write().unwrap();
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| Error::NotFound(user_id.to_string()))?;
        user.total_books_donated = total_books_donated;
        user.badge = badge;
        Ok(user.clone())
    }
}

#[async_trait]
impl DriveRepositoryTrait for InMemoryStore {
    async fn create(&self, _new_drive: NewDonationDrive) -> Result<DonationDrive> {
        unimplemented!()
    }

    fn find_by_id(&self, drive_id: &str) -> Result<Option<DonationDrive>> {
        Ok(self.state.read().unwrap().drives.get(drive_id).cloned())
    }

    fn list(&self, _status_filter: Option<DriveStatus>) -> Result<Vec<DonationDrive>> {
        Ok(self.state.read().unwrap().drives.values().cloned().collect())
    }

    async fn add_books_received(&self, _drive_id: &str, _books: BookCounts) -> Result<DonationDrive> {
        unimplemented!()
    }

    async fn set_books_received(
        &self,
        _drive_id: &str,
        _books: BookCounts,
        _total: u64,
    ) -> Result<DonationDrive> {
        unimplemented!()
    }
}

#[async_trait]
impl SchoolRepositoryTrait for InMemoryStore {
    async fn create(&self, _new_school: NewSchool) -> Result<School> {
        unimplemented!()
    }

    fn find_by_id(&self, school_id: &str) -> Result<Option<School>> {
        Ok(self.state.read().unwrap().schools.get(school_id).cloned())
    }

    fn list(&self) -> Result<Vec<School>> {
        Ok(self.state.read().unwrap().schools.values().cloned().collect())
    }

    async fn add_books_received(&self, school_id: &str, books: u64) -> Result<School> {
        let mut state = self.state.write().unwrap();
        let school = state
            .schools
            .get_mut(school_id)
            .ok_or_else(|| Error::NotFound(school_id.to_string()))?;
        school.total_books_received += books;
        Ok(school.clone())
    }
}

#[async_trait]
impl DonationRepositoryTrait for InMemoryStore {
    async fn create(&self, _new_donation: NewDonationRecord) -> Result<DonationRecord> {
        unimplemented!()
    }

    fn find_by_id(&self, donation_id: &str) -> Result<Option<DonationRecord>> {
        Ok(self
            .state
            .read()
            .unwrap()
            .donations
            .iter()
            .find(|d| d.id == donation_id)
            .cloned())
    }

    fn list_for_donor_in_drive(
        &self,
        donor_id: &str,
        drive_id: &str,
        statuses: &[DonationStatus],
    ) -> Result<Vec<DonationRecord>> {
        let mut records: Vec<DonationRecord> = self
            .state
            .read()
            .unwrap()
            .donations
            .iter()
            .filter(|d| d.donor_id == donor_id && d.drive_id == drive_id)
            .filter(|d| statuses.is_empty() || statuses.contains(&d.status))
            .cloned()
            .collect();
        records.sort_by_key(|d| d.donation_date);
        Ok(records)
    }

    fn list_for_drive(
        &self,
        drive_id: &str,
        statuses: &[DonationStatus],
    ) -> Result<Vec<DonationRecord>> {
        let mut records: Vec<DonationRecord> = self
            .state
            .read()
            .unwrap()
            .donations
            .iter()
            .filter(|d| d.drive_id == drive_id)
            .filter(|d| statuses.is_empty() || statuses.contains(&d.status))
            .cloned()
            .collect();
        records.sort_by_key(|d| d.donation_date);
        Ok(records)
    }

    fn list_for_donor(&self, donor_id: &str) -> Result<Vec<DonationRecord>> {
        Ok(self
            .state
            .read()
            .unwrap()
            .donations
            .iter()
            .filter(|d| d.donor_id == donor_id)
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<DonationRecord>> {
        Ok(self.state.read().unwrap().donations.clone())
    }

    async fn update_allocated_counts(&self, updates: Vec<(String, BookCounts)>) -> Result<()> {
        let mut state = self.state.write().unwrap();
        for (id, allocated) in updates {
            let record = state
                .donations
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| Error::NotFound(id.clone()))?;
            record.allocated_count = allocated;
        }
        Ok(())
    }

    async fn update_status(
        &self,
        _donation_id: &str,
        _status: DonationStatus,
        _collected_at: Option<NaiveDateTime>,
    ) -> Result<DonationRecord> {
        unimplemented!()
    }
}

#[async_trait]
impl AllocationRepositoryTrait for InMemoryStore {
    async fn create(&self, new_allocation: NewBookAllocation) -> Result<BookAllocation> {
        let mut state = self.state.write().unwrap();
        self.insert_allocation(&mut state, new_allocation)
    }

    fn find_by_id(&self, allocation_id: &str) -> Result<Option<BookAllocation>> {
        Ok(self
            .state
            .read()
            .unwrap()
            .allocations
            .iter()
            .find(|a| a.id == allocation_id)
            .cloned())
    }

    fn list(&self, filter: &AllocationFilter) -> Result<Vec<BookAllocation>> {
        let mut allocations: Vec<BookAllocation> = self
            .state
            .read()
            .unwrap()
            .allocations
            .iter()
            .filter(|a| match filter {
                AllocationFilter::All => true,
                AllocationFilter::Drive(id) => &a.drive_id == id,
                AllocationFilter::School(id) => &a.school_id == id,
            })
            .cloned()
            .collect();
        allocations.reverse();
        Ok(allocations)
    }

    fn list_using_donations(&self, donation_ids: &[String]) -> Result<Vec<BookAllocation>> {
        let mut allocations: Vec<BookAllocation> = self
            .state
            .read()
            .unwrap()
            .allocations
            .iter()
            .filter(|a| a.donations_used.iter().any(|id| donation_ids.contains(id)))
            .cloned()
            .collect();
        allocations.reverse();
        Ok(allocations)
    }

    async fn update_status(
        &self,
        allocation_id: &str,
        status: AllocationStatus,
        delivery_date: Option<NaiveDateTime>,
    ) -> Result<BookAllocation> {
        let mut state = self.state.write().unwrap();
        let allocation = state
            .allocations
            .iter_mut()
            .find(|a| a.id == allocation_id)
            .ok_or_else(|| Error::NotFound(allocation_id.to_string()))?;
        allocation.status = status;
        allocation.delivery_date = delivery_date;
        Ok(allocation.clone())
    }
}

#[async_trait]
impl AllocationStoreTrait for InMemoryStore {
    async fn commit_allocation(&self, commit: AllocationCommit) -> Result<AllocationCommitOutcome> {
        let mut guard = self.state.write().unwrap();
        // Work on a copy and only publish it when every step succeeded.
        let mut state = guard.clone();

        for debit in &commit.debits {
            let record = state
                .donations
                .iter_mut()
                .find(|d| d.id == debit.donation_id)
                .ok_or_else(|| Error::NotFound(debit.donation_id.clone()))?;
            let after = record.allocated_count.saturating_add(&debit.debit);
            if !after.fits_within(&record.books_count) {
                return Err(AllocationError::ConcurrentModification {
                    donation_id: debit.donation_id.clone(),
                }
                .into());
            }
            record.allocated_count = after;
        }

        let mut donor_totals = Vec::new();
        for donor_id in commit.donor_ids() {
            donor_totals.push(donor_totals_in(&mut state, &donor_id)?);
        }

        let allocation = self.insert_allocation(&mut state, commit.allocation)?;
        state
            .schools
            .get_mut(&allocation.school_id)
            .ok_or_else(|| Error::NotFound(allocation.school_id.clone()))?
            .total_books_received += allocation.total_books_allocated;

        *guard = state;
        Ok(AllocationCommitOutcome {
            allocation,
            donor_totals,
        })
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn user(id: &str, role: UserRole) -> User {
    User {
        id: id.to_string(),
        name: id.to_string(),
        email: format!("{}@example.com", id),
        phone: "9000000000".to_string(),
        role,
        is_active: true,
        total_books_donated: 0,
        badge: Badge::None,
        created_at: base_time(),
        updated_at: base_time(),
    }
}

fn drive(id: &str) -> DonationDrive {
    DonationDrive {
        id: id.to_string(),
        name: format!("Drive {}", id),
        description: None,
        location: "Clubhouse".to_string(),
        gated_community: "Palm Grove".to_string(),
        coordinator: ContactInfo::default(),
        administrator_id: "admin".to_string(),
        status: DriveStatus::Active,
        start_date: base_time(),
        end_date: None,
        instructions: None,
        books_received: BookCounts::ZERO,
        total_books_received: 0,
        created_at: base_time(),
        updated_at: base_time(),
    }
}

fn school(id: &str) -> School {
    School {
        id: id.to_string(),
        name: format!("School {}", id),
        address: Address::default(),
        contact_person: ContactInfo::default(),
        school_type: SchoolType::Government,
        students_count: 200,
        is_active: true,
        total_books_received: 0,
        created_at: base_time(),
        updated_at: base_time(),
    }
}

struct Fixture {
    store: Arc<InMemoryStore>,
    sink: MockDomainEventSink,
    service: Arc<AllocationService>,
}

impl Fixture {
    fn new(mode: AllocationMode) -> Self {
        let store = Arc::new(InMemoryStore::default());
        {
            let mut state = store.state.write().unwrap();
            for u in [user("admin", UserRole::Admin), user("donor", UserRole::Donor), user("other", UserRole::Donor)] {
                state.users.insert(u.id.clone(), u);
            }
            for d in [drive("drive"), drive("drive-2")] {
                state.drives.insert(d.id.clone(), d);
            }
            state.schools.insert("school".to_string(), school("school"));
        }
        let sink = MockDomainEventSink::new();
        let service = Arc::new(AllocationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(sink.clone()),
            mode,
        ));
        Self {
            store,
            sink,
            service,
        }
    }

    /// Adds a donation `days` after the base date and returns its id.
    fn donate(&self, donor: &str, drive: &str, days: i64, books: BookCounts) -> String {
        let mut state = self.store.state.write().unwrap();
        let id = format!("don-{}", state.donations.len() + 1);
        let date = base_time() + Duration::days(days);
        state.donations.push(DonationRecord {
            id: id.clone(),
            donor_id: donor.to_string(),
            drive_id: drive.to_string(),
            donation_date: date,
            books_count: books,
            allocated_count: BookCounts::ZERO,
            total_books: books.total(),
            status: DonationStatus::Submitted,
            collected_at: None,
            notes: None,
            created_at: date,
            updated_at: date,
        });
        let d = state.drives.get_mut(drive).unwrap();
        d.books_received = d.books_received.saturating_add(&books);
        d.total_books_received = d.books_received.total();
        id
    }
}

fn request(donor: Option<&str>, books: BookCounts) -> AllocationRequest {
    AllocationRequest {
        drive_id: "drive".to_string(),
        donor_id: donor.map(str::to_string),
        school_id: "school".to_string(),
        books_allocated: books,
        notes: Some("Library corner".to_string()),
        allocated_by: "admin".to_string(),
    }
}

fn ages_2_4(n: u32) -> BookCounts {
    BookCounts::of(AgeCategory::Ages2To4, n)
}

fn allocation_error(err: Error) -> AllocationError {
    match err {
        Error::Allocation(e) => e,
        other => panic!("expected an allocation error, got {:?}", other),
    }
}

const MODES: [AllocationMode; 2] = [AllocationMode::Transactional, AllocationMode::Sequential];

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_single_record_exact_allocation_awards_bronze() {
    for mode in MODES {
        let fx = Fixture::new(mode);
        let donation = fx.donate("donor", "drive", 0, ages_2_4(10));

        let allocation = fx
            .service
            .allocate(request(Some("donor"), ages_2_4(10)))
            .await
            .unwrap();

        assert_eq!(allocation.total_books_allocated, 10);
        assert_eq!(allocation.donations_used, vec![donation.clone()]);
        assert_eq!(fx.store.donation(&donation).allocated_count, ages_2_4(10));
        let donor = fx.store.user("donor");
        assert_eq!(donor.total_books_donated, 10);
        assert_eq!(donor.badge, Badge::Bronze);
        assert_eq!(fx.store.school("school").total_books_received, 10);

        let events = fx.sink.events();
        assert!(matches!(
            &events[0],
            DomainEvent::AllocationCreated { total_books: 10, donor_ids, .. } if donor_ids == &vec!["donor".to_string()]
        ));
        assert_eq!(
            events[1],
            DomainEvent::badge_changed("donor".to_string(), Badge::None, Badge::Bronze)
        );
    }
}

#[tokio::test]
async fn test_request_above_availability_is_rejected_without_changes() {
    for mode in MODES {
        let fx = Fixture::new(mode);
        fx.donate("donor", "drive", 0, ages_2_4(10));
        let before = fx.store.snapshot();

        let err = fx
            .service
            .allocate(request(Some("donor"), ages_2_4(11)))
            .await
            .unwrap_err();

        match err {
            Error::Allocation(AllocationError::CategoryInsufficient(shortfalls)) => {
                assert_eq!(
                    shortfalls,
                    vec![CategoryShortfall {
                        category: AgeCategory::Ages2To4,
                        available: 10,
                        requested: 11,
                    }]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let after = fx.store.snapshot();
        assert_eq!(after.donations, before.donations);
        assert!(after.allocations.is_empty());
        assert_eq!(after.users, before.users);
        assert!(fx.sink.is_empty());
    }
}

#[tokio::test]
async fn test_fifo_spans_records_oldest_first() {
    for mode in MODES {
        let fx = Fixture::new(mode);
        let newest = fx.donate("donor", "drive", 5, ages_2_4(8));
        let oldest = fx.donate("donor", "drive", 1, ages_2_4(5));

        let allocation = fx
            .service
            .allocate(request(Some("donor"), ages_2_4(10)))
            .await
            .unwrap();

        assert_eq!(allocation.donations_used, vec![oldest.clone(), newest.clone()]);
        assert_eq!(fx.store.donation(&oldest).allocated_count, ages_2_4(5));
        let newest_record = fx.store.donation(&newest);
        assert_eq!(newest_record.allocated_count, ages_2_4(5));
        assert_eq!(newest_record.slack(AgeCategory::Ages2To4), 3);
    }
}

#[tokio::test]
async fn test_empty_request_is_rejected() {
    let fx = Fixture::new(AllocationMode::Transactional);
    fx.donate("donor", "drive", 0, ages_2_4(10));

    let err = fx
        .service
        .allocate(request(Some("donor"), BookCounts::ZERO))
        .await
        .unwrap_err();

    assert_eq!(allocation_error(err), AllocationError::EmptyAllocation);
    assert!(fx.store.snapshot().allocations.is_empty());
}

#[tokio::test]
async fn test_structural_errors() {
    let fx = Fixture::new(AllocationMode::Transactional);
    fx.donate("donor", "drive", 0, ages_2_4(10));

    let err = fx.service.allocate(request(None, ages_2_4(1))).await.unwrap_err();
    assert_eq!(allocation_error(err), AllocationError::DonorRequired);

    let err = fx
        .service
        .allocate(request(Some("ghost"), ages_2_4(1)))
        .await
        .unwrap_err();
    assert_eq!(allocation_error(err), AllocationError::DonorNotFound("ghost".to_string()));

    let mut missing_drive = request(Some("donor"), ages_2_4(1));
    missing_drive.drive_id = "nope".to_string();
    let err = fx.service.allocate(missing_drive).await.unwrap_err();
    assert_eq!(allocation_error(err), AllocationError::DriveNotFound("nope".to_string()));

    let mut missing_school = request(Some("donor"), ages_2_4(1));
    missing_school.school_id = "nope".to_string();
    let err = fx.service.allocate(missing_school).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Allocation(AllocationError::SchoolNotFound(_))
    ));
}

#[tokio::test]
async fn test_other_donors_and_drives_do_not_count() {
    let fx = Fixture::new(AllocationMode::Transactional);
    fx.donate("other", "drive", 0, ages_2_4(30));
    fx.donate("donor", "drive-2", 0, ages_2_4(30));
    fx.donate("donor", "drive", 0, ages_2_4(2));

    let err = fx
        .service
        .allocate(request(Some("donor"), ages_2_4(3)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Allocation(AllocationError::CategoryInsufficient(_))
    ));
}

#[tokio::test]
async fn test_donor_total_counts_allocations_across_drives() {
    let fx = Fixture::new(AllocationMode::Transactional);
    let elsewhere = fx.donate("donor", "drive-2", 0, BookCounts::new(0, 45, 0, 0));
    {
        let mut state = fx.store.state.write().unwrap();
        let record = state.donations.iter_mut().find(|d| d.id == elsewhere).unwrap();
        record.allocated_count = BookCounts::new(0, 45, 0, 0);
        let donor = state.users.get_mut("donor").unwrap();
        donor.total_books_donated = 45;
        donor.badge = Badge::Bronze;
    }
    fx.donate("donor", "drive", 0, BookCounts::new(3, 0, 2, 0));

    fx.service
        .allocate(request(Some("donor"), BookCounts::new(3, 0, 2, 0)))
        .await
        .unwrap();

    let donor = fx.store.user("donor");
    assert_eq!(donor.total_books_donated, 50);
    assert_eq!(donor.badge, Badge::Silver);
}

#[tokio::test]
async fn test_sequential_failure_leaves_consumption_persisted() {
    let fx = Fixture::new(AllocationMode::Sequential);
    let donation = fx.donate("donor", "drive", 0, ages_2_4(10));
    fx.store.fail_allocation_create.store(true, Ordering::SeqCst);

    let err = fx
        .service
        .allocate(request(Some("donor"), ages_2_4(4)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Database(DatabaseError::QueryFailed(_))));
    assert_eq!(fx.store.donation(&donation).allocated_count, ages_2_4(4));
    assert!(fx.store.snapshot().allocations.is_empty());
    assert_eq!(fx.store.school("school").total_books_received, 0);
    assert!(fx.sink.is_empty());
}

#[tokio::test]
async fn test_transactional_failure_leaves_everything_unchanged() {
    let fx = Fixture::new(AllocationMode::Transactional);
    let donation = fx.donate("donor", "drive", 0, ages_2_4(10));
    fx.store.fail_allocation_create.store(true, Ordering::SeqCst);
    let before = fx.store.snapshot();

    let err = fx
        .service
        .allocate(request(Some("donor"), ages_2_4(4)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Database(DatabaseError::QueryFailed(_))));
    assert_eq!(fx.store.donation(&donation).allocated_count, BookCounts::ZERO);
    let after = fx.store.snapshot();
    assert_eq!(after.users, before.users);
    assert!(after.allocations.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_overdraw() {
    let fx = Fixture::new(AllocationMode::Transactional);
    let donation = fx.donate("donor", "drive", 0, ages_2_4(10));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = fx.service.clone();
            tokio::spawn(async move { service.allocate(request(Some("donor"), ages_2_4(3))).await })
        })
        .collect();
    let results = futures::future::join_all(handles).await;

    let succeeded = results
        .into_iter()
        .map(|joined| joined.unwrap())
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(succeeded, 3);
    let record = fx.store.donation(&donation);
    assert_eq!(record.allocated_count, ages_2_4(9));
    assert!(!record.is_over_allocated());
    assert_eq!(fx.store.user("donor").total_books_donated, 9);
}

#[tokio::test]
async fn test_store_guard_reports_concurrent_modification() {
    let fx = Fixture::new(AllocationMode::Transactional);
    let donation = fx.donate("donor", "drive", 0, ages_2_4(5));

    let commit = AllocationCommit {
        allocation: NewBookAllocation {
            drive_id: "drive".to_string(),
            school_id: "school".to_string(),
            allocated_by: "admin".to_string(),
            books_allocated: ages_2_4(6),
            donations_used: vec![donation.clone()],
            notes: None,
        },
        debits: vec![DonationDebit {
            donation_id: donation.clone(),
            donor_id: "donor".to_string(),
            debit: ages_2_4(6),
            allocated_after: ages_2_4(6),
        }],
    };
    let err = fx.store.commit_allocation(commit).await.unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(
        allocation_error(err),
        AllocationError::ConcurrentModification {
            donation_id: donation.clone()
        }
    );
    assert_eq!(fx.store.donation(&donation).allocated_count, BookCounts::ZERO);
}

#[tokio::test]
async fn test_donors_with_inventory_groups_by_donor() {
    let fx = Fixture::new(AllocationMode::Transactional);
    fx.donate("other", "drive", 3, BookCounts::new(0, 4, 0, 0));
    fx.donate("donor", "drive", 1, ages_2_4(6));
    fx.donate("donor", "drive", 5, BookCounts::new(1, 0, 0, 2));
    fx.donate("donor", "drive-2", 0, ages_2_4(50));

    fx.service
        .allocate(request(Some("donor"), ages_2_4(6)))
        .await
        .unwrap();

    let inventories = fx.service.get_donors_with_inventory("drive").unwrap();
    assert_eq!(inventories.len(), 2);
    assert_eq!(inventories[0].donor.id, "donor");
    assert_eq!(inventories[0].donations.len(), 2);
    assert_eq!(inventories[0].available, BookCounts::new(1, 0, 0, 2));
    assert_eq!(inventories[1].donor.id, "other");
    assert_eq!(inventories[1].available, BookCounts::new(0, 4, 0, 0));

    assert!(matches!(
        fx.service.get_donors_with_inventory("missing"),
        Err(Error::Allocation(AllocationError::DriveNotFound(_)))
    ));
}

#[tokio::test]
async fn test_donor_history_and_drive_inventory() {
    let fx = Fixture::new(AllocationMode::Transactional);
    fx.donate("donor", "drive", 0, BookCounts::new(10, 10, 0, 0));
    fx.donate("other", "drive", 0, BookCounts::new(0, 0, 5, 0));

    fx.service
        .allocate(request(Some("donor"), BookCounts::new(4, 0, 0, 0)))
        .await
        .unwrap();
    fx.service
        .allocate(request(Some("donor"), BookCounts::new(1, 6, 0, 0)))
        .await
        .unwrap();
    fx.service
        .allocate(request(Some("other"), BookCounts::new(0, 0, 2, 0)))
        .await
        .unwrap();

    let history = fx.service.get_donor_allocation_history("donor").unwrap();
    assert_eq!(history.allocations.len(), 2);
    assert_eq!(history.summary.total_allocated, 11);
    assert_eq!(history.summary.by_category, BookCounts::new(5, 6, 0, 0));
    assert_eq!(history.allocations[0].school_name.as_deref(), Some("School school"));
    assert_eq!(history.allocations[0].drive_name.as_deref(), Some("Drive drive"));

    let empty = fx.service.get_donor_allocation_history("admin").unwrap();
    assert_eq!(empty, DonorAllocationHistory::default());

    let inventory = fx.service.get_drive_inventory("drive").unwrap();
    assert_eq!(inventory.books_received, BookCounts::new(10, 10, 5, 0));
    assert_eq!(inventory.books_allocated, BookCounts::new(5, 6, 2, 0));
    assert_eq!(inventory.available, BookCounts::new(5, 4, 3, 0));
    assert_eq!(inventory.total_available, 12);

    let by_school = fx
        .service
        .get_allocations(AllocationFilter::School("school".to_string()))
        .unwrap();
    assert_eq!(by_school.len(), 3);
    assert_eq!(by_school[0].total_books_allocated, 2);
}

#[tokio::test]
async fn test_update_status_records_delivery_date_only_on_delivery() {
    let fx = Fixture::new(AllocationMode::Transactional);
    fx.donate("donor", "drive", 0, ages_2_4(10));
    let allocation = fx
        .service
        .allocate(request(Some("donor"), ages_2_4(2)))
        .await
        .unwrap();
    let delivered_on = base_time() + Duration::days(7);

    let updated = fx
        .service
        .update_allocation_status(&allocation.id, AllocationStatus::Confirmed, Some(delivered_on))
        .await
        .unwrap();
    assert_eq!(updated.status, AllocationStatus::Confirmed);
    assert_eq!(updated.delivery_date, None);

    let updated = fx
        .service
        .update_allocation_status(&allocation.id, AllocationStatus::Delivered, Some(delivered_on))
        .await
        .unwrap();
    assert_eq!(updated.delivery_date, Some(delivered_on));

    let err = fx
        .service
        .update_allocation_status("missing", AllocationStatus::Delivered, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Allocation(AllocationError::AllocationNotFound(_))
    ));
}

fn request_in(drive_id: &str, donor: &str, books: BookCounts) -> AllocationRequest {
    AllocationRequest {
        drive_id: drive_id.to_string(),
        ..request(Some(donor), books)
    }
}

#[tokio::test]
async fn test_donor_total_matches_allocations_drawn_from_their_donations() {
    for mode in MODES {
        let fx = Fixture::new(mode);
        fx.donate("donor", "drive", 0, BookCounts::new(6, 4, 0, 0));
        fx.donate("donor", "drive", 2, BookCounts::new(3, 0, 5, 0));
        fx.donate("donor", "drive-2", 1, BookCounts::new(0, 0, 0, 20));
        fx.donate("other", "drive", 0, BookCounts::new(9, 0, 0, 0));

        for (drive_id, books) in [
            ("drive", BookCounts::new(7, 1, 0, 0)),
            ("drive", BookCounts::new(2, 3, 4, 0)),
            ("drive-2", BookCounts::new(0, 0, 0, 12)),
        ] {
            fx.service
                .allocate(request_in(drive_id, "donor", books))
                .await
                .unwrap();
        }
        fx.service
            .allocate(request(Some("other"), ages_2_4(5)))
            .await
            .unwrap();

        let history = fx.service.get_donor_allocation_history("donor").unwrap();
        let allocated: u64 = history
            .allocations
            .iter()
            .map(|a| a.total_books_allocated)
            .sum();
        assert_eq!(history.allocations.len(), 3, "{:?}", mode);
        assert_eq!(allocated, 29, "{:?}", mode);
        assert_eq!(fx.store.user("donor").total_books_donated, allocated, "{:?}", mode);
        assert_eq!(fx.store.user("other").total_books_donated, 5, "{:?}", mode);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sequential_totals_stay_exact_across_drives() {
    let fx = Fixture::new(AllocationMode::Sequential);
    fx.donate("donor", "drive", 0, ages_2_4(40));
    fx.donate("donor", "drive-2", 0, ages_2_4(40));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = fx.service.clone();
            let drive_id = if i % 2 == 0 { "drive" } else { "drive-2" };
            tokio::spawn(async move {
                service
                    .allocate(request_in(drive_id, "donor", ages_2_4(3)))
                    .await
            })
        })
        .collect();
    for joined in futures::future::join_all(handles).await {
        joined.unwrap().unwrap();
    }

    let donor = fx.store.user("donor");
    assert_eq!(donor.total_books_donated, 24);
    assert_eq!(donor.badge, Badge::Bronze);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_locks_are_released_after_allocations() {
    let fx = Fixture::new(AllocationMode::Sequential);
    fx.donate("donor", "drive", 0, ages_2_4(10));
    fx.donate("other", "drive-2", 0, ages_2_4(10));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let service = fx.service.clone();
            let (drive_id, donor) = if i % 2 == 0 { ("drive", "donor") } else { ("drive-2", "other") };
            tokio::spawn(async move {
                service
                    .allocate(request_in(drive_id, donor, ages_2_4(2)))
                    .await
            })
        })
        .collect();
    futures::future::join_all(handles).await;
    let _ = fx
        .service
        .allocate(request(Some("donor"), ages_2_4(100)))
        .await
        .unwrap_err();

    assert_eq!(fx.service.held_lock_count(), 0);
}
