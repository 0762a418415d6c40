//! Donation record domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::books::{AgeCategory, BookCounts, CategoryBalance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    #[default]
    Submitted,
    Collected,
    Allocated,
}

impl DonationStatus {
    /// Statuses whose records still count towards a donor's inventory.
    pub const ALLOCATABLE: [DonationStatus; 2] =
        [DonationStatus::Submitted, DonationStatus::Collected];

    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Submitted => "submitted",
            DonationStatus::Collected => "collected",
            DonationStatus::Allocated => "allocated",
        }
    }

    pub fn is_allocatable(&self) -> bool {
        Self::ALLOCATABLE.contains(self)
    }
}

impl FromStr for DonationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(DonationStatus::Submitted),
            "collected" => Ok(DonationStatus::Collected),
            "allocated" => Ok(DonationStatus::Allocated),
            _ => Err(format!("Unknown donation status: {}", s)),
        }
    }
}

/// A donor's pledge of books to one drive.
///
/// `books_count` is fixed at creation. `allocated_count` only grows, and never
/// exceeds `books_count` in any category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub id: String,
    pub donor_id: String,
    pub drive_id: String,
    pub donation_date: NaiveDateTime,
    pub books_count: BookCounts,
    pub allocated_count: BookCounts,
    pub total_books: u64,
    pub status: DonationStatus,
    pub collected_at: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl DonationRecord {
    /// Units of `category` not yet allocated. Zero for over-allocated records.
    pub fn slack(&self, category: AgeCategory) -> u32 {
        self.books_count
            .get(category)
            .saturating_sub(self.allocated_count.get(category))
    }

    /// Signed `books_count - allocated_count` per category.
    pub fn remaining(&self) -> CategoryBalance {
        let mut balance = CategoryBalance::from_counts(&self.books_count);
        balance.sub_counts(&self.allocated_count);
        balance
    }

    pub fn total_allocated(&self) -> u64 {
        self.allocated_count.total()
    }

    pub fn is_over_allocated(&self) -> bool {
        !self.allocated_count.fits_within(&self.books_count)
    }
}

/// Repository input for a new donation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonationRecord {
    pub id: Option<String>,
    pub donor_id: String,
    pub drive_id: String,
    pub donation_date: NaiveDateTime,
    pub books_count: BookCounts,
    pub notes: Option<String>,
}

/// Accepts a bare date (`2024-05-01`, read as midnight), RFC 3339 with an
/// offset (converted to UTC), or a naive date-time.
mod donation_date_format {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{self, Deserialize, Deserializer};

    fn parse(value: &str) -> Option<NaiveDateTime> {
        let trimmed = value.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.naive_utc());
        }
        trimmed.parse::<NaiveDateTime>().ok()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid donation date '{}'", raw)))
    }
}

/// A donor's submission as received from the caller, before strict validation
/// of the category vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationSubmission {
    #[serde(alias = "donationDriveId")]
    pub drive_id: String,
    #[serde(deserialize_with = "donation_date_format::deserialize")]
    pub donation_date: NaiveDateTime,
    pub books_count: serde_json::Value,
    #[serde(default)]
    pub notes: Option<String>,
}
