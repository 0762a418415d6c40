//! Database models for schools.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use bookdrive_core::drives::ContactInfo;
use bookdrive_core::schools::{Address, NewSchool, School};

use crate::utils::{to_u32, to_u64};

/// Database model for schools
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::schools)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SchoolDB {
    pub id: String,
    pub name: String,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub school_type: String,
    pub students_count: i64,
    pub is_active: bool,
    pub total_books_received: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SchoolDB {
    pub fn from_new(new_school: NewSchool, id: String, now: NaiveDateTime) -> Self {
        Self {
            id,
            name: new_school.name,
            street: new_school.address.street,
            city: new_school.address.city,
            state: new_school.address.state,
            zip_code: new_school.address.zip_code,
            contact_name: new_school.contact_person.name,
            contact_phone: new_school.contact_person.phone,
            contact_email: new_school.contact_person.email,
            school_type: new_school.school_type.as_str().to_string(),
            students_count: i64::from(new_school.students_count),
            is_active: true,
            total_books_received: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<SchoolDB> for School {
    fn from(db: SchoolDB) -> Self {
        Self {
            id: db.id,
            name: db.name,
            address: Address {
                street: db.street,
                city: db.city,
                state: db.state,
                zip_code: db.zip_code,
            },
            contact_person: ContactInfo {
                name: db.contact_name,
                phone: db.contact_phone,
                email: db.contact_email,
            },
            school_type: db.school_type.parse().unwrap_or_default(),
            students_count: to_u32(db.students_count),
            is_active: db.is_active,
            total_books_received: to_u64(db.total_books_received),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
