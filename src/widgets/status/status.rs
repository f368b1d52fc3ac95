use crate::core::session::Session;
use eframe::egui;

/// Status bar: date, load counts, playback, backend
pub struct StatusBar {
    pub current_message: String,
    backend_url: String,
}

impl StatusBar {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            current_message: String::new(),
            backend_url: backend_url.into(),
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.current_message = message.into();
    }

    /// Render status bar at bottom of screen
    pub fn render(&self, ctx: &egui::Context, session: &Session, render_time_ms: f32) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.monospace(session.selected_date());
                ui.separator();

                let counts = session.counts();
                ui.monospace(format!(
                    "{:>2}/{:<2} loaded | {} loading | {} errors",
                    counts.loaded, counts.total, counts.loading, counts.error
                ));
                ui.separator();

                // Frame position
                if counts.total > 0 {
                    ui.monospace(format!("{}/{}", session.current_index() + 1, counts.total));
                } else {
                    ui.monospace("-/-");
                }
                ui.separator();

                ui.monospace(session.playback_state().to_string());
                ui.separator();

                ui.monospace(format!("{:.1}ms", render_time_ms));
                ui.separator();

                ui.monospace(&self.backend_url);

                if !self.current_message.is_empty() {
                    ui.separator();
                    ui.monospace(&self.current_message);
                }
            });
        });
    }
}
