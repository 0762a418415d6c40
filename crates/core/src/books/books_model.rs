//! Age categories and the per-category book count vector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Child age band a book is suitable for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeCategory {
    #[serde(rename = "2-4")]
    Ages2To4,
    #[serde(rename = "4-6")]
    Ages4To6,
    #[serde(rename = "6-8")]
    Ages6To8,
    #[serde(rename = "8-10")]
    Ages8To10,
}

impl AgeCategory {
    /// Every category, in display order.
    pub const ALL: [AgeCategory; 4] = [
        AgeCategory::Ages2To4,
        AgeCategory::Ages4To6,
        AgeCategory::Ages6To8,
        AgeCategory::Ages8To10,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeCategory::Ages2To4 => "2-4",
            AgeCategory::Ages4To6 => "4-6",
            AgeCategory::Ages6To8 => "6-8",
            AgeCategory::Ages8To10 => "8-10",
        }
    }

    fn index(self) -> usize {
        match self {
            AgeCategory::Ages2To4 => 0,
            AgeCategory::Ages4To6 => 1,
            AgeCategory::Ages6To8 => 2,
            AgeCategory::Ages8To10 => 3,
        }
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AgeCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown category {}", s))
    }
}

/// Quantities of books keyed by age category.
///
/// The key set is closed: deserializing an object with any other key fails.
/// Keys that are absent default to zero so partially written vectors stay readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookCounts {
    #[serde(rename = "2-4", default)]
    pub ages_2_4: u32,
    #[serde(rename = "4-6", default)]
    pub ages_4_6: u32,
    #[serde(rename = "6-8", default)]
    pub ages_6_8: u32,
    #[serde(rename = "8-10", default)]
    pub ages_8_10: u32,
}

impl BookCounts {
    pub const ZERO: BookCounts = BookCounts {
        ages_2_4: 0,
        ages_4_6: 0,
        ages_6_8: 0,
        ages_8_10: 0,
    };

    pub fn new(ages_2_4: u32, ages_4_6: u32, ages_6_8: u32, ages_8_10: u32) -> Self {
        Self {
            ages_2_4,
            ages_4_6,
            ages_6_8,
            ages_8_10,
        }
    }

    /// A vector with a single non-zero category.
    pub fn of(category: AgeCategory, count: u32) -> Self {
        let mut counts = Self::ZERO;
        counts.set(category, count);
        counts
    }

    pub fn get(&self, category: AgeCategory) -> u32 {
        match category {
            AgeCategory::Ages2To4 => self.ages_2_4,
            AgeCategory::Ages4To6 => self.ages_4_6,
            AgeCategory::Ages6To8 => self.ages_6_8,
            AgeCategory::Ages8To10 => self.ages_8_10,
        }
    }

    pub fn set(&mut self, category: AgeCategory, count: u32) {
        match category {
            AgeCategory::Ages2To4 => self.ages_2_4 = count,
            AgeCategory::Ages4To6 => self.ages_4_6 = count,
            AgeCategory::Ages6To8 => self.ages_6_8 = count,
            AgeCategory::Ages8To10 => self.ages_8_10 = count,
        }
    }

    /// Iterates `(category, count)` pairs in category order.
    pub fn iter(&self) -> impl Iterator<Item = (AgeCategory, u32)> {
        let counts = *self;
        AgeCategory::ALL.into_iter().map(move |c| (c, counts.get(c)))
    }

    /// Sum over all categories.
    pub fn total(&self) -> u64 {
        self.iter().map(|(_, n)| u64::from(n)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn checked_add(&self, other: &BookCounts) -> Option<BookCounts> {
        let mut out = BookCounts::ZERO;
        for category in AgeCategory::ALL {
            out.set(category, self.get(category).checked_add(other.get(category))?);
        }
        Some(out)
    }

    pub fn saturating_add(&self, other: &BookCounts) -> BookCounts {
        let mut out = BookCounts::ZERO;
        for category in AgeCategory::ALL {
            out.set(category, self.get(category).saturating_add(other.get(category)));
        }
        out
    }

    pub fn saturating_sub(&self, other: &BookCounts) -> BookCounts {
        let mut out = BookCounts::ZERO;
        for category in AgeCategory::ALL {
            out.set(category, self.get(category).saturating_sub(other.get(category)));
        }
        out
    }

    /// True when every category of `self` is at most the same category of `limit`.
    pub fn fits_within(&self, limit: &BookCounts) -> bool {
        AgeCategory::ALL
            .into_iter()
            .all(|c| self.get(c) <= limit.get(c))
    }
}

/// Signed per-category balance.
///
/// Availability is computed with signed arithmetic so that corrupt records
/// (allocated above pledged) tighten the balance instead of wrapping. Only
/// [`CategoryBalance::clamped`] should be shown to users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryBalance([i64; 4]);

impl CategoryBalance {
    pub fn from_counts(counts: &BookCounts) -> Self {
        let mut balance = Self::default();
        balance.add_counts(counts);
        balance
    }

    pub fn get(&self, category: AgeCategory) -> i64 {
        self.0[category.index()]
    }

    pub fn add_counts(&mut self, counts: &BookCounts) {
        for (category, n) in counts.iter() {
            self.0[category.index()] += i64::from(n);
        }
    }

    pub fn sub_counts(&mut self, counts: &BookCounts) {
        for (category, n) in counts.iter() {
            self.0[category.index()] -= i64::from(n);
        }
    }

    /// Display view: negatives become zero.
    pub fn clamped(&self) -> BookCounts {
        let mut out = BookCounts::ZERO;
        for category in AgeCategory::ALL {
            let value = self.get(category).clamp(0, i64::from(u32::MAX));
            out.set(category, u32::try_from(value).unwrap_or(u32::MAX));
        }
        out
    }
}
