//! SQLite storage implementation for Bookdrive.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `bookdrive-core` and contains:
//! - Database connection pooling and the single writer actor
//! - Diesel migrations
//! - Repository implementations for users, drives, schools, donations and allocations
//! - The atomic allocation commit used in transactional mode
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! The core crate is database-agnostic and works with traits.
//!
//! ```text
//!   core (domain)
//!         │
//!         ▼
//! storage-sqlite (this crate)
//!         │
//!         ▼
//!     SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod allocations;
pub mod donations;
pub mod drives;
pub mod schools;
pub mod users;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use allocations::AllocationRepository;
pub use donations::DonationRepository;
pub use drives::DriveRepository;
pub use schools::SchoolRepository;
pub use users::UserRepository;

// Re-export from bookdrive-core for convenience
pub use bookdrive_core::errors::{DatabaseError, Error, Result};
