//! Small helpers shared by the repositories.

use bookdrive_core::books::BookCounts;

/// Upper bound on ids bound into one `IN (...)` clause.
///
/// SQLite caps statement parameters (999 on older builds). 500 leaves room
/// for the other parameters of the query.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Splits a slice into chunks small enough for an `IN (...)` clause.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Converts a stored count back into a domain count.
///
/// Negative values cannot be written through the schema's CHECK constraints;
/// they are clamped to zero when reading rows written by older tools.
pub(crate) fn to_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

pub(crate) fn to_u64(value: i64) -> u64 {
    value.max(0) as u64
}

/// Builds a category vector from its four stored columns.
pub(crate) fn counts_from_columns(
    ages_2_4: i64,
    ages_4_6: i64,
    ages_6_8: i64,
    ages_8_10: i64,
) -> BookCounts {
    BookCounts::new(
        to_u32(ages_2_4),
        to_u32(ages_4_6),
        to_u32(ages_6_8),
        to_u32(ages_8_10),
    )
}

/// The four stored columns of a category vector, youngest band first.
pub(crate) fn counts_to_columns(counts: &BookCounts) -> [i64; 4] {
    [
        i64::from(counts.ages_2_4),
        i64::from(counts.ages_4_6),
        i64::from(counts.ages_6_8),
        i64::from(counts.ages_8_10),
    ]
}
