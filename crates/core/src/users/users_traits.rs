use async_trait::async_trait;

use super::users_model::{Badge, NewUser, User};
use crate::errors::Result;

/// Trait defining the contract for User repository operations.
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User>;

    fn find_by_id(&self, user_id: &str) -> Result<Option<User>>;

    fn list(&self) -> Result<Vec<User>>;

    /// Overwrites the denormalized donation total and badge.
    async fn update_donation_totals(
        &self,
        user_id: &str,
        total_books_donated: u64,
        badge: Badge,
    ) -> Result<User>;
}

/// Trait defining the contract for User service operations.
#[async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Retrieves a user, failing with `NotFound` when absent.
    fn get_user(&self, user_id: &str) -> Result<User>;

    fn list_users(&self) -> Result<Vec<User>>;
}
