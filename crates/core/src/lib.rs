//! Bookdrive Core - Domain entities, services, and traits.
//!
//! This crate contains the business logic for community book donation
//! drives: donor pledges, allocation of donated books to schools, and the
//! repair of denormalized totals. It is database-agnostic and defines traits
//! that are implemented by the `storage-sqlite` crate.

pub mod allocations;
pub mod books;
pub mod consistency;
pub mod constants;
pub mod donations;
pub mod drives;
pub mod errors;
pub mod events;
pub mod schools;
pub mod users;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
