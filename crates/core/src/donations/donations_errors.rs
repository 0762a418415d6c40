use thiserror::Error;

/// Errors raised while recording or updating donations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DonationError {
    #[error("Donation drive not found")]
    DriveNotFound(String),

    #[error("Donation drive is not active")]
    DriveNotActive(String),

    #[error("Donor not found")]
    DonorNotFound(String),

    #[error("At least one book must be donated")]
    EmptyDonation,

    #[error("Donation not found")]
    DonationNotFound(String),
}

impl DonationError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DonationError::DriveNotFound(_)
                | DonationError::DonorNotFound(_)
                | DonationError::DonationNotFound(_)
        )
    }
}
