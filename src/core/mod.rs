//! Core engine modules - preloading, playback, session, workers
//!
//! These modules form the viewer engine, independent of UI.

pub mod generation;
pub mod metrics;
pub mod preload;
pub mod sequencer;
pub mod session;
pub mod status;
pub mod workers;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use generation::Generation;
pub use metrics::{LoadCounts, PreloadMetrics};
pub use preload::{PreloadConfig, PreloadManager};
pub use sequencer::{PlaybackState, Sequencer};
pub use session::{Session, SessionConfig};
pub use status::{ImageHandle, LoadStatus, LoadedImage};
pub use workers::Workers;
