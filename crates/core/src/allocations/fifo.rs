//! Oldest-first consumption of a donor's donation records.

use super::allocations_errors::AllocationError;
use super::allocations_model::DonationDebit;
use crate::books::BookCounts;
use crate::donations::DonationRecord;

/// Debits produced by one consumption run, one entry per touched record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumptionPlan {
    pub debits: Vec<DonationDebit>,
}

impl ConsumptionPlan {
    /// Touched record ids, in first-touched order.
    pub fn donation_ids(&self) -> Vec<String> {
        self.debits.iter().map(|d| d.donation_id.clone()).collect()
    }

    /// Sum of every debit. Equals the demand for a successful run.
    pub fn total(&self) -> BookCounts {
        self.debits
            .iter()
            .fold(BookCounts::ZERO, |acc, d| acc.saturating_add(&d.debit))
    }
}

/// Plans how `demand` is taken from `records`.
///
/// Records are ordered by `donation_date`, keeping input order for ties. Each
/// category is walked independently, taking from the oldest record with slack
/// first. The input is never modified; the plan carries the new
/// `allocated_count` of every touched record.
///
/// Running out of records with demand left is an invariant breach, because
/// demand should already have been checked against availability.
pub fn plan_fifo_consumption(
    records: &[DonationRecord],
    demand: &BookCounts,
) -> Result<ConsumptionPlan, AllocationError> {
    let mut working: Vec<&DonationRecord> = records.iter().collect();
    working.sort_by_key(|r| r.donation_date);

    let mut allocated: Vec<BookCounts> = working.iter().map(|r| r.allocated_count).collect();
    let mut touched: Vec<usize> = Vec::new();

    for (category, requested) in demand.iter() {
        let mut need = requested;
        for (idx, record) in working.iter().enumerate() {
            if need == 0 {
                break;
            }
            let already = allocated[idx].get(category);
            let slack = record.books_count.get(category).saturating_sub(already);
            if slack == 0 {
                continue;
            }
            let take = need.min(slack);
            allocated[idx].set(category, already + take);
            need -= take;
            if !touched.contains(&idx) {
                touched.push(idx);
            }
        }
        if need > 0 {
            return Err(AllocationError::InventoryShortfall {
                category,
                unmet: need,
            });
        }
    }

    let debits = touched
        .into_iter()
        .map(|idx| {
            let record = working[idx];
            DonationDebit {
                donation_id: record.id.clone(),
                donor_id: record.donor_id.clone(),
                debit: allocated[idx].saturating_sub(&record.allocated_count),
                allocated_after: allocated[idx],
            }
        })
        .collect();

    Ok(ConsumptionPlan { debits })
}
