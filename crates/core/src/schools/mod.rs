//! Schools module - recipients of allocated books.

mod schools_model;
mod schools_service;
mod schools_traits;

pub use schools_model::{Address, NewSchool, School, SchoolType};
pub use schools_service::SchoolService;
pub use schools_traits::{SchoolRepositoryTrait, SchoolServiceTrait};
