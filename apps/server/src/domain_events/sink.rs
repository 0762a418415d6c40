use bookdrive_core::events::{DomainEvent, DomainEventSink};

/// Writes every domain event to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDomainEventSink;

impl LoggingDomainEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl DomainEventSink for LoggingDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        match &event {
            DomainEvent::DonationSubmitted {
                donation_id,
                donor_id,
                drive_id,
                total_books,
            } => tracing::info!(
                donation_id = %donation_id,
                donor_id = %donor_id,
                drive_id = %drive_id,
                total_books,
                "Donation submitted"
            ),
            DomainEvent::AllocationCreated {
                allocation_id,
                drive_id,
                school_id,
                donor_ids,
                total_books,
            } => tracing::info!(
                allocation_id = %allocation_id,
                drive_id = %drive_id,
                school_id = %school_id,
                donors = donor_ids.len(),
                total_books,
                "Allocation created"
            ),
            DomainEvent::BadgeChanged {
                user_id,
                old_badge,
                new_badge,
            } => tracing::info!(
                user_id = %user_id,
                old_badge = %old_badge,
                new_badge = %new_badge,
                "Donor badge changed"
            ),
            DomainEvent::DriveTotalsRecalculated { drive_ids } => {
                tracing::info!(drives = drive_ids.len(), "Drive totals recalculated")
            }
        }
    }
}
