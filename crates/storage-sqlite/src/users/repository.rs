use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use bookdrive_core::errors::{Error, Result};
use bookdrive_core::users::{Badge, NewUser, User, UserRepositoryTrait};

use super::model::UserDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::users;

pub struct UserRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl UserRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        UserRepository { pool, writer }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<User> {
                let id = new_user
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let user_db = UserDB::from_new(new_user, id, Utc::now().naive_utc());

                let result_db = diesel::insert_into(users::table)
                    .values(&user_db)
                    .returning(UserDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(User::from(result_db))
            })
            .await
    }

    fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let mut conn = get_connection(&self.pool)?;
        let user_db = users::table
            .find(user_id)
            .select(UserDB::as_select())
            .first::<UserDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(user_db.map(User::from))
    }

    fn list(&self) -> Result<Vec<User>> {
        let mut conn = get_connection(&self.pool)?;
        let users_db = users::table
            .select(UserDB::as_select())
            .order((users::created_at.asc(), users::name.asc()))
            .load::<UserDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(users_db.into_iter().map(User::from).collect())
    }

    async fn update_donation_totals(
        &self,
        user_id: &str,
        total_books_donated: u64,
        badge: Badge,
    ) -> Result<User> {
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<User> {
                let result_db = diesel::update(users::table.find(&user_id))
                    .set((
                        users::total_books_donated
                            .eq(i64::try_from(total_books_donated).unwrap_or(i64::MAX)),
                        users::badge.eq(badge.as_str()),
                        users::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .returning(UserDB::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                result_db
                    .map(User::from)
                    .ok_or_else(|| Error::NotFound(format!("User {}", user_id)))
            })
            .await
    }
}
