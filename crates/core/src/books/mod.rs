//! Books module - the age-category vector used everywhere books are counted.

mod books_input;
mod books_model;

pub use books_input::sanitize_book_count;
pub use books_model::{AgeCategory, BookCounts, CategoryBalance};
