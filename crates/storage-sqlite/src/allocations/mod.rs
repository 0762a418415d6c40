//! SQLite storage implementation for book allocations.
//!
//! [`AllocationRepository`] also implements the atomic allocation commit used
//! by the transactional allocation mode.

mod model;
mod repository;
mod store;

pub use model::{AllocationDonationDB, BookAllocationDB};
pub use repository::AllocationRepository;

#[cfg(test)]
mod allocations_storage_tests;
