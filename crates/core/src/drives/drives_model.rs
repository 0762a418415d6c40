//! Donation drive domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::books::BookCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriveStatus {
    #[default]
    Active,
    Inactive,
    Completed,
}

impl DriveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriveStatus::Active => "active",
            DriveStatus::Inactive => "inactive",
            DriveStatus::Completed => "completed",
        }
    }
}

impl FromStr for DriveStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(DriveStatus::Active),
            "inactive" => Ok(DriveStatus::Inactive),
            "completed" => Ok(DriveStatus::Completed),
            _ => Err(format!("Unknown drive status: {}", s)),
        }
    }
}

/// Embedded contact details (drive coordinator, school contact person).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Domain model representing a community book donation drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationDrive {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub gated_community: String,
    pub coordinator: ContactInfo,
    pub administrator_id: String,
    pub status: DriveStatus,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub instructions: Option<String>,
    /// Everything ever donated to this drive. Allocation never decrements it.
    pub books_received: BookCounts,
    pub total_books_received: u64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonationDrive {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub gated_community: String,
    #[serde(default)]
    pub coordinator: ContactInfo,
    pub administrator_id: String,
    pub start_date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub instructions: Option<String>,
}
