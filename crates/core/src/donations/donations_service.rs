use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;

use super::donations_errors::DonationError;
use super::donations_model::{DonationRecord, DonationStatus, DonationSubmission, NewDonationRecord};
use super::donations_traits::{DonationRepositoryTrait, DonationServiceTrait};
use crate::books::BookCounts;
use crate::drives::{DriveRepositoryTrait, DriveStatus};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::users::UserRepositoryTrait;

/// Service for donor submissions and donation lifecycle updates.
pub struct DonationService {
    donation_repository: Arc<dyn DonationRepositoryTrait>,
    drive_repository: Arc<dyn DriveRepositoryTrait>,
    user_repository: Arc<dyn UserRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl DonationService {
    pub fn new(
        donation_repository: Arc<dyn DonationRepositoryTrait>,
        drive_repository: Arc<dyn DriveRepositoryTrait>,
        user_repository: Arc<dyn UserRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            donation_repository,
            drive_repository,
            user_repository,
            event_sink,
        }
    }
}

#[async_trait::async_trait]
impl DonationServiceTrait for DonationService {
    async fn submit_donation(
        &self,
        donor_id: &str,
        submission: DonationSubmission,
    ) -> Result<DonationRecord> {
        let drive = self
            .drive_repository
            .find_by_id(&submission.drive_id)?
            .ok_or_else(|| DonationError::DriveNotFound(submission.drive_id.clone()))?;
        if drive.status != DriveStatus::Active {
            return Err(DonationError::DriveNotActive(drive.id).into());
        }
        if self.user_repository.find_by_id(donor_id)?.is_none() {
            return Err(DonationError::DonorNotFound(donor_id.to_string()).into());
        }

        let books_count = BookCounts::from_strict(&submission.books_count)?;
        if books_count.is_empty() {
            return Err(DonationError::EmptyDonation.into());
        }

        let record = self
            .donation_repository
            .create(NewDonationRecord {
                id: None,
                donor_id: donor_id.to_string(),
                drive_id: drive.id.clone(),
                donation_date: submission.donation_date,
                books_count,
                notes: submission.notes,
            })
            .await?;

        // The donor's lifetime total counts allocated books only, so it is
        // left alone here; only the drive's received vector grows.
        let drive = self
            .drive_repository
            .add_books_received(&drive.id, books_count)
            .await?;
        debug!(
            "Drive {} now has {} books received",
            drive.id, drive.total_books_received
        );

        info!(
            "Donation {} of {} books submitted by {} to drive {}",
            record.id, record.total_books, donor_id, drive.id
        );
        self.event_sink.emit(DomainEvent::donation_submitted(
            record.id.clone(),
            record.donor_id.clone(),
            record.drive_id.clone(),
            record.total_books,
        ));
        Ok(record)
    }

    async fn update_donation_status(
        &self,
        donation_id: &str,
        status: DonationStatus,
    ) -> Result<DonationRecord> {
        let existing = self
            .donation_repository
            .find_by_id(donation_id)?
            .ok_or_else(|| DonationError::DonationNotFound(donation_id.to_string()))?;

        let collected_at = if status == DonationStatus::Collected {
            Some(Utc::now().naive_utc())
        } else {
            existing.collected_at
        };
        self.donation_repository
            .update_status(donation_id, status, collected_at)
            .await
    }

    fn get_donations_for_donor(&self, donor_id: &str) -> Result<Vec<DonationRecord>> {
        self.donation_repository.list_for_donor(donor_id)
    }

    fn get_all_donations(&self) -> Result<Vec<DonationRecord>> {
        self.donation_repository.list_all()
    }
}
