//! Bottom status bar and the loading progress bar

pub mod progress_bar;
pub mod status;

pub use progress_bar::ProgressBar;
pub use status::StatusBar;
