use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use bookdrive_core::errors::{Error, Result};
use bookdrive_core::schools::{NewSchool, School, SchoolRepositoryTrait};

use super::model::SchoolDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::schools;

pub struct SchoolRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SchoolRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        SchoolRepository { pool, writer }
    }
}

/// Adds `books` to a school's cumulative total. Returns the number of rows touched.
pub(crate) fn increment_books_received(
    conn: &mut SqliteConnection,
    school_id: &str,
    books: u64,
    now: NaiveDateTime,
) -> std::result::Result<usize, StorageError> {
    let books = i64::try_from(books).unwrap_or(i64::MAX);
    let rows = diesel::update(schools::table.find(school_id))
        .set((
            schools::total_books_received.eq(schools::total_books_received + books),
            schools::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(rows)
}

#[async_trait]
impl SchoolRepositoryTrait for SchoolRepository {
    async fn create(&self, new_school: NewSchool) -> Result<School> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<School> {
                let id = new_school
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let school_db = SchoolDB::from_new(new_school, id, Utc::now().naive_utc());

                let result_db = diesel::insert_into(schools::table)
                    .values(&school_db)
                    .returning(SchoolDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(School::from(result_db))
            })
            .await
    }

    fn find_by_id(&self, school_id: &str) -> Result<Option<School>> {
        let mut conn = get_connection(&self.pool)?;
        let school_db = schools::table
            .find(school_id)
            .select(SchoolDB::as_select())
            .first::<SchoolDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(school_db.map(School::from))
    }

    fn list(&self) -> Result<Vec<School>> {
        let mut conn = get_connection(&self.pool)?;
        let schools_db = schools::table
            .select(SchoolDB::as_select())
            .order(schools::name.asc())
            .load::<SchoolDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(schools_db.into_iter().map(School::from).collect())
    }

    async fn add_books_received(&self, school_id: &str, books: u64) -> Result<School> {
        let school_id = school_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<School> {
                let rows =
                    increment_books_received(conn, &school_id, books, Utc::now().naive_utc())?;
                if rows == 0 {
                    return Err(Error::NotFound(format!("School {}", school_id)));
                }
                let result_db = schools::table
                    .find(&school_id)
                    .select(SchoolDB::as_select())
                    .first::<SchoolDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(School::from(result_db))
            })
            .await
    }
}
