//! EPIC Viewer - NASA EPIC Earth imagery browser library
//!
//! Re-exports all modules for use by the binary target.

// Core engine (preload, playback, session, workers)
pub mod core;

// Backend access
pub mod api;
pub mod server;

// App modules
pub mod app;
pub mod cli;
pub mod config;
pub mod entities;
pub mod error;
pub mod widgets;

// Re-export commonly used types from core
pub use core::session::{Session, SessionConfig};
pub use core::workers::Workers;

// Re-export entities
pub use entities::{ImageRecord, ImageSet, RateLimitState};
pub use error::{EpicError, Result};
