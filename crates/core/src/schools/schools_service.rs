use std::sync::Arc;

use super::schools_model::{NewSchool, School};
use super::schools_traits::{SchoolRepositoryTrait, SchoolServiceTrait};
use crate::errors::{Error, Result, ValidationError};

pub struct SchoolService {
    repository: Arc<dyn SchoolRepositoryTrait>,
}

impl SchoolService {
    pub fn new(repository: Arc<dyn SchoolRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl SchoolServiceTrait for SchoolService {
    async fn create_school(&self, new_school: NewSchool) -> Result<School> {
        if new_school.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        self.repository.create(new_school).await
    }

    fn get_school(&self, school_id: &str) -> Result<School> {
        self.repository
            .find_by_id(school_id)?
            .ok_or_else(|| Error::NotFound(format!("School {}", school_id)))
    }

    fn list_schools(&self) -> Result<Vec<School>> {
        self.repository.list()
    }
}
