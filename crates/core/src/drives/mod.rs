//! Drives module - donation drive models, services, and traits.

mod drives_model;
mod drives_service;
mod drives_traits;

pub use drives_model::{ContactInfo, DonationDrive, DriveStatus, NewDonationDrive};
pub use drives_service::DriveService;
pub use drives_traits::{DriveRepositoryTrait, DriveServiceTrait};
