//! Allocations module - moving donated books from donors to schools.
//!
//! Availability is always derived from donation records, requests are checked
//! by the validator, and inventory is consumed oldest donation first.

mod allocations_errors;
mod allocations_model;
mod allocations_service;
mod allocations_traits;
mod availability;
mod fifo;
mod validator;

pub use allocations_errors::{AllocationError, AllocationErrorKind, CategoryShortfall};
pub use allocations_model::*;
pub use allocations_service::AllocationService;
pub use allocations_traits::{
    AllocationRepositoryTrait, AllocationServiceTrait, AllocationStoreTrait,
};
pub use availability::{donor_available, drive_available, lifetime_allocated};
pub use fifo::{plan_fifo_consumption, ConsumptionPlan};
pub use validator::{category_shortfalls, validate_allocation, AllocationCheck};

#[cfg(test)]
mod allocations_service_tests;
