//! Application module - EpicApp and related functionality.
//!
//! - `run` - eframe::App implementation (per-frame update, persistence)
//! - `events` - keyboard input and widget actions applied to the session

mod events;
mod run;

use crate::config::Settings;
use crate::core::session::Session;
use crate::server::EpicServer;
use crate::widgets::carousel::TextureCache;
use crate::widgets::status::StatusBar;

/// Main application state.
///
/// Only `settings` is persisted; everything else is rebuilt on startup.
pub struct EpicApp {
    pub settings: Settings,
    pub session: Session,
    pub textures: TextureCache,
    pub status_bar: StatusBar,
    pub last_render_time_ms: f32,
    /// Embedded backend for `--demo`, stopped when the app closes
    pub demo_server: Option<EpicServer>,
}

impl EpicApp {
    pub fn new(settings: Settings, session: Session, backend_url: &str, demo_server: Option<EpicServer>) -> Self {
        Self {
            settings,
            session,
            textures: TextureCache::default(),
            status_bar: StatusBar::new(backend_url),
            last_render_time_ms: 0.0,
            demo_server,
        }
    }
}
