use async_trait::async_trait;

use super::consistency_model::ConsistencyReport;
use crate::errors::Result;

/// Trait defining the contract for maintenance and repair operations.
#[async_trait]
pub trait ConsistencyServiceTrait: Send + Sync {
    /// Rebuilds every drive's received vector and total from its donation
    /// records. Returns the number of drives written. Idempotent.
    async fn recalculate_drive_totals(&self) -> Result<usize>;

    /// Re-derives every user's lifetime allocated total and badge. Returns the
    /// number of users whose stored values changed.
    async fn reconcile_donor_totals(&self) -> Result<usize>;

    fn audit(&self) -> Result<ConsistencyReport>;
}
