//! User domain models and the donor badge rule.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{BADGE_BRONZE_THRESHOLD, BADGE_GOLD_THRESHOLD, BADGE_SILVER_THRESHOLD};

/// Donor recognition tier. Ordered: `None < Bronze < Silver < Gold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
}

impl Badge {
    /// The badge for a lifetime allocated-book total.
    pub fn for_total(total_books_donated: u64) -> Badge {
        if total_books_donated >= BADGE_GOLD_THRESHOLD {
            Badge::Gold
        } else if total_books_donated >= BADGE_SILVER_THRESHOLD {
            Badge::Silver
        } else if total_books_donated >= BADGE_BRONZE_THRESHOLD {
            Badge::Bronze
        } else {
            Badge::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::None => "none",
            Badge::Bronze => "bronze",
            Badge::Silver => "silver",
            Badge::Gold => "gold",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Badge {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Badge::None),
            "bronze" => Ok(Badge::Bronze),
            "silver" => Ok(Badge::Silver),
            "gold" => Ok(Badge::Gold),
            _ => Err(format!("Unknown badge: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Donor,
    Admin,
    Coordinator,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Donor => "donor",
            UserRole::Admin => "admin",
            UserRole::Coordinator => "coordinator",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "donor" => Ok(UserRole::Donor),
            "admin" => Ok(UserRole::Admin),
            "coordinator" => Ok(UserRole::Coordinator),
            _ => Err(format!("Unknown user role: {}", s)),
        }
    }
}

/// Domain model representing a user (donor, admin, or coordinator).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub is_active: bool,
    /// Lifetime books allocated out of this user's donations.
    #[serde(rename = "totalBooksDonatted")]
    pub total_books_donated: u64,
    pub badge: Badge,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
}
