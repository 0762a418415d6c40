//! Consistency module - detection and repair of denormalized totals.

mod consistency_checker;
mod consistency_model;
mod consistency_service;
mod consistency_traits;

pub use consistency_checker::{check_allocation, check_drive, is_consistent};
pub use consistency_model::{
    ConsistencyReport, OverAllocatedDonation, TotalMismatch, TotalMismatchKind,
};
pub use consistency_service::ConsistencyService;
pub use consistency_traits::ConsistencyServiceTrait;
