//! Entities module - immutable data fetched from the EPIC backend
//!
//! - `ImageRecord` / `ImageSet`: per-date image metadata
//! - `RateLimitState`: API quota counters for the badge
//! - `date`: `YYYY-MM-DD` parsing, normalization and display

pub mod date;
pub mod image_record;
pub mod rate_limit;

pub use image_record::{Coordinates, ImageRecord, ImageSet, Position};
pub use rate_limit::RateLimitState;
