//! Coercion of loosely typed category vectors coming from callers.
//!
//! Read paths use [`BookCounts::from_lenient`]: anything unusable counts as zero.
//! Write paths use [`BookCounts::from_strict`]: the vector must be complete and clean.

use serde_json::Value;

use super::books_model::{AgeCategory, BookCounts};
use crate::errors::{Result, ValidationError};

/// Coerces a single value to a non-negative book count.
///
/// Numbers are truncated toward zero. A string counts only when the whole
/// trimmed string is a number, so `"12abc"` is 0 and `"1e3"` is 1000.
/// Negative, null, boolean, and non-numeric input yields 0.
pub fn sanitize_book_count(value: &Value) -> u32 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u32::try_from(u).unwrap_or(u32::MAX)
            } else {
                n.as_f64().map(truncate_count).unwrap_or(0)
            }
        }
        Value::String(s) => s.trim().parse::<f64>().map(truncate_count).unwrap_or(0),
        _ => 0,
    }
}

fn truncate_count(f: f64) -> u32 {
    if f.is_finite() && f > 0.0 {
        f.trunc().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

impl BookCounts {
    /// Lenient read-path coercion. Unknown keys are ignored and missing ones are zero.
    pub fn from_lenient(value: &Value) -> BookCounts {
        let mut counts = BookCounts::ZERO;
        if let Value::Object(map) = value {
            for category in AgeCategory::ALL {
                if let Some(v) = map.get(category.as_str()) {
                    counts.set(category, sanitize_book_count(v));
                }
            }
        }
        counts
    }

    /// Strict write-path parsing. Every problem found is reported, not just the first.
    pub fn from_strict(value: &Value) -> Result<BookCounts> {
        let map = value.as_object().ok_or_else(|| {
            ValidationError::BookCounts(vec!["Book counts must be an object".to_string()])
        })?;

        let mut problems = Vec::new();
        for key in map.keys() {
            if key.parse::<AgeCategory>().is_err() {
                problems.push(format!("Unknown category {}", key));
            }
        }

        let mut counts = BookCounts::ZERO;
        for category in AgeCategory::ALL {
            match map.get(category.as_str()) {
                None | Some(Value::Null) => {
                    problems.push(format!("Missing category {}", category));
                }
                Some(Value::Number(n)) => match strict_count(n) {
                    Ok(count) => counts.set(category, count),
                    Err(StrictCountError::Negative) => problems.push(format!(
                        "Negative values not allowed for category {}",
                        category
                    )),
                    Err(StrictCountError::Invalid) => {
                        problems.push(format!("Invalid value for category {}", category))
                    }
                },
                Some(_) => problems.push(format!("Invalid value for category {}", category)),
            }
        }

        if problems.is_empty() {
            Ok(counts)
        } else {
            Err(ValidationError::BookCounts(problems).into())
        }
    }
}

enum StrictCountError {
    Negative,
    Invalid,
}

fn strict_count(n: &serde_json::Number) -> std::result::Result<u32, StrictCountError> {
    if let Some(u) = n.as_u64() {
        return u32::try_from(u).map_err(|_| StrictCountError::Invalid);
    }
    if let Some(i) = n.as_i64() {
        return if i < 0 {
            Err(StrictCountError::Negative)
        } else {
            Err(StrictCountError::Invalid)
        };
    }
    match n.as_f64() {
        Some(f) if f < 0.0 => Err(StrictCountError::Negative),
        Some(f) if f.fract() == 0.0 && f <= f64::from(u32::MAX) => Ok(f as u32),
        _ => Err(StrictCountError::Invalid),
    }
}
