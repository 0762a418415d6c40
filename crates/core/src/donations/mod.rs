//! Donations module - donor pledges and their lifecycle.

mod donations_errors;
mod donations_model;
mod donations_service;
mod donations_traits;

pub use donations_errors::DonationError;
pub use donations_model::{DonationRecord, DonationStatus, DonationSubmission, NewDonationRecord};
pub use donations_service::DonationService;
pub use donations_traits::{DonationRepositoryTrait, DonationServiceTrait};
