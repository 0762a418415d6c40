//! SQLite storage implementation for donation drives.

mod model;
mod repository;

pub use model::DonationDriveDB;
pub use repository::DriveRepository;
