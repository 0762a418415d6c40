//! Users module - donors, admins, coordinators, and the badge rule.

mod users_model;
mod users_service;
mod users_traits;

pub use users_model::{Badge, NewUser, User, UserRole};
pub use users_service::UserService;
pub use users_traits::{UserRepositoryTrait, UserServiceTrait};
