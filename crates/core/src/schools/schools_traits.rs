use async_trait::async_trait;

use super::schools_model::{NewSchool, School};
use crate::errors::Result;

/// Trait defining the contract for School repository operations.
#[async_trait]
pub trait SchoolRepositoryTrait: Send + Sync {
    async fn create(&self, new_school: NewSchool) -> Result<School>;

    fn find_by_id(&self, school_id: &str) -> Result<Option<School>>;

    fn list(&self) -> Result<Vec<School>>;

    /// Increments the school's cumulative received total.
    async fn add_books_received(&self, school_id: &str, books: u64) -> Result<School>;
}

/// Trait defining the contract for School service operations.
#[async_trait]
pub trait SchoolServiceTrait: Send + Sync {
    async fn create_school(&self, new_school: NewSchool) -> Result<School>;

    fn get_school(&self, school_id: &str) -> Result<School>;

    fn list_schools(&self) -> Result<Vec<School>>;
}
