use log::info;
use std::sync::Arc;

use super::drives_model::{DonationDrive, NewDonationDrive};
use super::drives_traits::{DriveRepositoryTrait, DriveServiceTrait};
use crate::constants::DEFAULT_DRIVE_INSTRUCTIONS;
use crate::errors::{Error, Result, ValidationError};

pub struct DriveService {
    repository: Arc<dyn DriveRepositoryTrait>,
}

impl DriveService {
    pub fn new(repository: Arc<dyn DriveRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl DriveServiceTrait for DriveService {
    async fn create_drive(&self, new_drive: NewDonationDrive) -> Result<DonationDrive> {
        for (field, value) in [
            ("name", &new_drive.name),
            ("location", &new_drive.location),
            ("gatedCommunity", &new_drive.gated_community),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field.to_string()).into());
            }
        }
        if let Some(end) = new_drive.end_date {
            if end < new_drive.start_date {
                return Err(ValidationError::InvalidInput(
                    "Drive end date is before its start date".to_string(),
                )
                .into());
            }
        }

        let new_drive = NewDonationDrive {
            instructions: new_drive
                .instructions
                .or_else(|| Some(DEFAULT_DRIVE_INSTRUCTIONS.to_string())),
            ..new_drive
        };
        let drive = self.repository.create(new_drive).await?;
        info!("Created donation drive {} ({})", drive.id, drive.name);
        Ok(drive)
    }

    fn get_drive(&self, drive_id: &str) -> Result<DonationDrive> {
        self.repository
            .find_by_id(drive_id)?
            .ok_or_else(|| Error::NotFound(format!("Donation drive {}", drive_id)))
    }
}
