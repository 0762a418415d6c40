//! Database models for users.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use bookdrive_core::users::{NewUser, User};

use crate::utils::to_u64;

/// Database model for users
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
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct UserDB {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub is_active: bool,
    pub total_books_donated: i64,
    pub badge: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl UserDB {
    pub fn from_new(new_user: NewUser, id: String, now: NaiveDateTime) -> Self {
        Self {
            id,
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            role: new_user.role.as_str().to_string(),
            is_active: true,
            total_books_donated: 0,
            badge: bookdrive_core::users::Badge::None.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<UserDB> for User {
    fn from(db: UserDB) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            phone: db.phone,
            role: db.role.parse().unwrap_or_default(),
            is_active: db.is_active,
            total_books_donated: to_u64(db.total_books_donated),
            badge: db.badge.parse().unwrap_or_default(),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
