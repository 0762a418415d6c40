//! School domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::drives::ContactInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SchoolType {
    #[default]
    Government,
    SemiGovernment,
}

impl SchoolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchoolType::Government => "government",
            SchoolType::SemiGovernment => "semi-government",
        }
    }
}

impl FromStr for SchoolType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "government" => Ok(SchoolType::Government),
            "semi-government" => Ok(SchoolType::SemiGovernment),
            _ => Err(format!("Unknown school type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Domain model representing a school that receives allocated books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: String,
    pub name: String,
    pub address: Address,
    pub contact_person: ContactInfo,
    pub school_type: SchoolType,
    pub students_count: u32,
    pub is_active: bool,
    /// Sum of every allocation ever made to this school.
    pub total_books_received: u64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new school.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSchool {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub contact_person: ContactInfo,
    #[serde(default)]
    pub school_type: SchoolType,
    #[serde(default)]
    pub students_count: u32,
}
