//! Domain event types.

use serde::{Deserialize, Serialize};

use crate::users::Badge;

/// Domain events emitted by core services after successful mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A donor pledged books to a drive.
    DonationSubmitted {
        donation_id: String,
        donor_id: String,
        drive_id: String,
        total_books: u64,
    },

    /// Books were allocated from donor donations to a school.
    AllocationCreated {
        allocation_id: String,
        drive_id: String,
        school_id: String,
        donor_ids: Vec<String>,
        total_books: u64,
    },

    /// A donor's badge tier changed after their allocated total was recomputed.
    BadgeChanged {
        user_id: String,
        old_badge: Badge,
        new_badge: Badge,
    },

    /// The drive-totals repair rewrote these drives.
    DriveTotalsRecalculated { drive_ids: Vec<String> },
}

impl DomainEvent {
    pub fn donation_submitted(
        donation_id: String,
        donor_id: String,
        drive_id: String,
        total_books: u64,
    ) -> Self {
        Self::DonationSubmitted {
            donation_id,
            donor_id,
            drive_id,
            total_books,
        }
    }

    pub fn allocation_created(
        allocation_id: String,
        drive_id: String,
        school_id: String,
        donor_ids: Vec<String>,
        total_books: u64,
    ) -> Self {
        Self::AllocationCreated {
            allocation_id,
            drive_id,
            school_id,
            donor_ids,
            total_books,
        }
    }

    pub fn badge_changed(user_id: String, old_badge: Badge, new_badge: Badge) -> Self {
        Self::BadgeChanged {
            user_id,
            old_badge,
            new_badge,
        }
    }

    pub fn drive_totals_recalculated(drive_ids: Vec<String>) -> Self {
        Self::DriveTotalsRecalculated { drive_ids }
    }
}
