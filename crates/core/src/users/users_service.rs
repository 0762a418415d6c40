use log::debug;
use std::sync::Arc;

use super::users_model::{NewUser, User};
use super::users_traits::{UserRepositoryTrait, UserServiceTrait};
use crate::errors::{Error, Result, ValidationError};

/// Service for reading and registering users.
pub struct UserService {
    repository: Arc<dyn UserRepositoryTrait>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl UserServiceTrait for UserService {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        if new_user.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        if new_user.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email".to_string()).into());
        }
        let normalized = NewUser {
            name: new_user.name.trim().to_string(),
            email: new_user.email.trim().to_lowercase(),
            ..new_user
        };
        debug!("Creating user {} with role {}", normalized.email, normalized.role.as_str());
        self.repository.create(normalized).await
    }

    fn get_user(&self, user_id: &str) -> Result<User> {
        self.repository
            .find_by_id(user_id)?
            .ok_or_else(|| Error::NotFound(format!("User {}", user_id)))
    }

    fn list_users(&self) -> Result<Vec<User>> {
        self.repository.list()
    }
}
