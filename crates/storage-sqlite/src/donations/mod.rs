//! SQLite storage implementation for donation records.

mod model;
mod repository;

pub use model::DonationRecordDB;
pub use repository::DonationRepository;

pub(crate) use repository::{apply_guarded_debit, lifetime_allocated_for_donor};
