//! Error taxonomy for EPIC data and image loading.
//!
//! - `Network` / `Http` / `InvalidResponse`: metadata request failed. Surfaced
//!   to the user, the current load cycle is aborted.
//! - `EmptyResult`: backend answered with zero images for the date.
//! - `ImageLoad`: a single image failed. Recovered locally by the preloader,
//!   never fatal to the whole set.
//! - `InvalidDate`: caller passed something that is not `YYYY-MM-DD`.
//!
//! Errors are `Clone` so the session can keep the last one around for display.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EpicError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("No images available for {date}. Please try a different date.")]
    EmptyResult { date: String },

    #[error("Failed to load image {id}: {reason}")]
    ImageLoad { id: String, reason: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, EpicError>;
