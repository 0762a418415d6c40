//! Tests against a real SQLite file: ordering, the guarded commit, and the
//! allocation engine end to end.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::tempdir;

use bookdrive_core::allocations::{
    AllocationCommit, AllocationError, AllocationFilter, AllocationMode, AllocationRepositoryTrait,
    AllocationRequest, AllocationService, AllocationServiceTrait, AllocationStoreTrait,
    DonationDebit, NewBookAllocation,
};
use bookdrive_core::books::BookCounts;
use bookdrive_core::donations::{DonationRecord, DonationRepositoryTrait, DonationStatus, NewDonationRecord};
use bookdrive_core::drives::{ContactInfo, DriveRepositoryTrait, NewDonationDrive};
use bookdrive_core::errors::{Error, ValidationError};
use bookdrive_core::events::NoOpDomainEventSink;
use bookdrive_core::schools::{NewSchool, SchoolRepositoryTrait};
use bookdrive_core::users::{Badge, NewUser, UserRepositoryTrait, UserRole};

use super::AllocationRepository;
use crate::db::{create_pool, run_migrations, spawn_writer};
use crate::donations::DonationRepository;
use crate::drives::DriveRepository;
use crate::schools::SchoolRepository;
use crate::users::UserRepository;

struct Fixture {
    users: Arc<UserRepository>,
    drives: Arc<DriveRepository>,
    schools: Arc<SchoolRepository>,
    donations: Arc<DonationRepository>,
    allocations: Arc<AllocationRepository>,
    _temp_dir: tempfile::TempDir,
}

fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 11, d)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

async fn setup() -> Fixture {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone());

    let fixture = Fixture {
        users: Arc::new(UserRepository::new(Arc::clone(&pool), writer.clone())),
        drives: Arc::new(DriveRepository::new(Arc::clone(&pool), writer.clone())),
        schools: Arc::new(SchoolRepository::new(Arc::clone(&pool), writer.clone())),
        donations: Arc::new(DonationRepository::new(Arc::clone(&pool), writer.clone())),
        allocations: Arc::new(AllocationRepository::new(Arc::clone(&pool), writer)),
        _temp_dir: temp_dir,
    };

    for (id, role) in [("admin", UserRole::Admin), ("donor", UserRole::Donor)] {
        fixture
            .users
            .create(NewUser {
                id: Some(id.to_string()),
                name: id.to_string(),
                email: format!("{}@example.com", id),
                phone: "555-0100".to_string(),
                role,
            })
            .await
            .unwrap();
    }
    fixture
        .drives
        .create(NewDonationDrive {
            id: Some("drive".to_string()),
            name: "Winter drive".to_string(),
            description: None,
            location: "Clubhouse".to_string(),
            gated_community: "Palm Meadows".to_string(),
            coordinator: ContactInfo::default(),
            administrator_id: "admin".to_string(),
            start_date: day(1),
            end_date: None,
            instructions: None,
        })
        .await
        .unwrap();
    fixture
        .schools
        .create(NewSchool {
            id: Some("school".to_string()),
            name: "Government Primary School".to_string(),
            address: Default::default(),
            contact_person: ContactInfo::default(),
            school_type: Default::default(),
            students_count: 120,
        })
        .await
        .unwrap();
    fixture
}

async fn donate(fixture: &Fixture, id: &str, date: NaiveDateTime, books: BookCounts) -> DonationRecord {
    fixture
        .donations
        .create(NewDonationRecord {
            id: Some(id.to_string()),
            donor_id: "donor".to_string(),
            drive_id: "drive".to_string(),
            donation_date: date,
            books_count: books,
            notes: None,
        })
        .await
        .unwrap()
}

fn commit_of(debits: Vec<(&str, BookCounts, BookCounts)>, books: BookCounts) -> AllocationCommit {
    AllocationCommit {
        allocation: NewBookAllocation {
            drive_id: "drive".to_string(),
            school_id: "school".to_string(),
            allocated_by: "admin".to_string(),
            books_allocated: books,
            donations_used: debits.iter().map(|(id, _, _)| id.to_string()).collect(),
            notes: None,
        },
        debits: debits
            .into_iter()
            .map(|(id, debit, allocated_after)| DonationDebit {
                donation_id: id.to_string(),
                donor_id: "donor".to_string(),
                debit,
                allocated_after,
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_donations_are_listed_oldest_first_with_insertion_tiebreak() {
    let fixture = setup().await;
    donate(&fixture, "late", day(9), BookCounts::new(1, 0, 0, 0)).await;
    donate(&fixture, "tie-a", day(3), BookCounts::new(2, 0, 0, 0)).await;
    donate(&fixture, "tie-b", day(3), BookCounts::new(3, 0, 0, 0)).await;

    let ids: Vec<String> = fixture
        .donations
        .list_for_donor_in_drive("donor", "drive", &DonationStatus::ALLOCATABLE)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["tie-a", "tie-b", "late"]);

    let newest: Vec<String> = fixture
        .donations
        .list_for_donor("donor")
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(newest.first().map(String::as_str), Some("late"));

    fixture
        .donations
        .update_status("late", DonationStatus::Allocated, None)
        .await
        .unwrap();
    let eligible = fixture
        .donations
        .list_for_drive("drive", &DonationStatus::ALLOCATABLE)
        .unwrap();
    assert_eq!(eligible.len(), 2);
}

#[tokio::test]
async fn test_drive_received_total_follows_breakdown() {
    let fixture = setup().await;
    fixture
        .drives
        .add_books_received("drive", BookCounts::new(10, 15, 5, 10))
        .await
        .unwrap();
    let drive = fixture
        .drives
        .add_books_received("drive", BookCounts::new(1, 0, 0, 0))
        .await
        .unwrap();
    assert_eq!(drive.books_received, BookCounts::new(11, 15, 5, 10));
    assert_eq!(drive.total_books_received, 41);

    let drive = fixture
        .drives
        .set_books_received("drive", BookCounts::new(25, 30, 25, 15), 100)
        .await
        .unwrap();
    assert_eq!(drive.total_books_received, 100);

    let err = fixture
        .drives
        .add_books_received("missing", BookCounts::new(1, 0, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_drive_received_overflow_is_rejected() {
    let fixture = setup().await;
    fixture
        .drives
        .set_books_received("drive", BookCounts::new(u32::MAX, 0, 0, 0), u64::from(u32::MAX))
        .await
        .unwrap();

    let err = fixture
        .drives
        .add_books_received("drive", BookCounts::new(1, 2, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::InvalidInput(_))));

    let drive = fixture.drives.find_by_id("drive").unwrap().unwrap();
    assert_eq!(drive.books_received, BookCounts::new(u32::MAX, 0, 0, 0));
    assert_eq!(drive.total_books_received, u64::from(u32::MAX));
}

#[tokio::test]
async fn test_commit_applies_every_write() {
    let fixture = setup().await;
    donate(&fixture, "old", day(2), BookCounts::new(5, 0, 0, 0)).await;
    donate(&fixture, "new", day(4), BookCounts::new(8, 0, 0, 0)).await;

    let outcome = fixture
        .allocations
        .commit_allocation(commit_of(
            vec![
                ("old", BookCounts::new(5, 0, 0, 0), BookCounts::new(5, 0, 0, 0)),
                ("new", BookCounts::new(5, 0, 0, 0), BookCounts::new(5, 0, 0, 0)),
            ],
            BookCounts::new(10, 0, 0, 0),
        ))
        .await
        .unwrap();

    assert_eq!(outcome.allocation.total_books_allocated, 10);
    assert_eq!(outcome.allocation.donations_used, vec!["old", "new"]);
    assert_eq!(outcome.donor_totals.len(), 1);
    assert_eq!(outcome.donor_totals[0].total_books_donated, 10);
    assert_eq!(outcome.donor_totals[0].previous_badge, Badge::None);
    assert_eq!(outcome.donor_totals[0].badge, Badge::Bronze);

    let old = fixture.donations.find_by_id("old").unwrap().unwrap();
    let new = fixture.donations.find_by_id("new").unwrap().unwrap();
    assert_eq!(old.allocated_count.ages_2_4, 5);
    assert_eq!(new.allocated_count.ages_2_4, 5);

    let donor = fixture.users.find_by_id("donor").unwrap().unwrap();
    assert_eq!(donor.total_books_donated, 10);
    assert_eq!(donor.badge, Badge::Bronze);
    let school = fixture.schools.find_by_id("school").unwrap().unwrap();
    assert_eq!(school.total_books_received, 10);

    let stored = fixture
        .allocations
        .find_by_id(&outcome.allocation.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.donations_used, vec!["old", "new"]);
    let using = fixture
        .allocations
        .list_using_donations(&["new".to_string()])
        .unwrap();
    assert_eq!(using.len(), 1);
    assert_eq!(
        fixture
            .allocations
            .list(&AllocationFilter::School("school".to_string()))
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_commit_rolls_back_when_a_guard_fails() {
    let fixture = setup().await;
    donate(&fixture, "old", day(2), BookCounts::new(5, 0, 0, 0)).await;
    donate(&fixture, "new", day(4), BookCounts::new(3, 0, 0, 0)).await;

    // The second debit asks for more than the record holds.
    let err = fixture
        .allocations
        .commit_allocation(commit_of(
            vec![
                ("old", BookCounts::new(5, 0, 0, 0), BookCounts::new(5, 0, 0, 0)),
                ("new", BookCounts::new(4, 0, 0, 0), BookCounts::new(4, 0, 0, 0)),
            ],
            BookCounts::new(9, 0, 0, 0),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Allocation(AllocationError::ConcurrentModification { ref donation_id })
            if donation_id == "new"
    ));

    let old = fixture.donations.find_by_id("old").unwrap().unwrap();
    assert_eq!(old.allocated_count, BookCounts::ZERO);
    assert!(fixture.allocations.list(&AllocationFilter::All).unwrap().is_empty());
    assert_eq!(fixture.users.find_by_id("donor").unwrap().unwrap().total_books_donated, 0);
    assert_eq!(
        fixture.schools.find_by_id("school").unwrap().unwrap().total_books_received,
        0
    );
}

#[tokio::test]
async fn test_allocation_service_over_sqlite() {
    let fixture = setup().await;
    donate(&fixture, "old", day(2), BookCounts::new(5, 0, 0, 0)).await;
    donate(&fixture, "new", day(4), BookCounts::new(8, 0, 0, 0)).await;

    let service = AllocationService::new(
        fixture.drives.clone(),
        fixture.users.clone(),
        fixture.schools.clone(),
        fixture.donations.clone(),
        fixture.allocations.clone(),
        fixture.allocations.clone(),
        Arc::new(NoOpDomainEventSink),
        AllocationMode::Transactional,
    );

    let request = |books| AllocationRequest {
        drive_id: "drive".to_string(),
        donor_id: Some("donor".to_string()),
        school_id: "school".to_string(),
        books_allocated: books,
        notes: Some("Library corner".to_string()),
        allocated_by: "admin".to_string(),
    };

    let allocation = service
        .allocate(request(BookCounts::new(10, 0, 0, 0)))
        .await
        .unwrap();
    assert_eq!(allocation.donations_used, vec!["old", "new"]);
    let new = fixture.donations.find_by_id("new").unwrap().unwrap();
    assert_eq!(new.remaining().get(bookdrive_core::books::AgeCategory::Ages2To4), 3);

    let err = service
        .allocate(request(BookCounts::new(4, 0, 0, 0)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Allocation(AllocationError::CategoryInsufficient(_))
    ));

    let history = service.get_donor_allocation_history("donor").unwrap();
    assert_eq!(history.summary.total_allocated, 10);
    assert_eq!(history.allocations.len(), 1);
    assert_eq!(
        history.allocations[0].school_name.as_deref(),
        Some("Government Primary School")
    );
}
