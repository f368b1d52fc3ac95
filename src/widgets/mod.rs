//! UI Widgets - modular, reusable UI components
//!
//! Widgets never mutate the session directly. They read it and push
//! [`ViewerAction`]s that the app applies after rendering.

pub mod carousel;
pub mod date_selector;
pub mod details;
pub mod monitor;
pub mod rate_limit;
pub mod status;

/// User intent collected during one frame
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerAction {
    SelectDate(String),
    TogglePlay,
    /// Pause and rewind
    Stop,
    Next,
    Previous,
    /// Dot indicator clicked
    SelectImage(usize),
    /// "Try Again" on the error panel
    Retry,
}
