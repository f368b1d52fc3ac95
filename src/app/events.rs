//! Input handling: keyboard shortcuts and widget actions.

use eframe::egui;
use log::{debug, trace, warn};

use super::EpicApp;
use crate::widgets::ViewerAction;

impl EpicApp {
    /// Map hotkeys to actions.
    ///
    /// - Space: play/pause
    /// - Escape: stop and rewind
    /// - Left/Right: previous/next image
    /// - F2: performance monitor
    /// - F3: details panel
    pub fn handle_keyboard_input(&mut self, ctx: &egui::Context, actions: &mut Vec<ViewerAction>) {
        // Don't process hotkeys when text input is active
        if ctx.wants_keyboard_input() {
            return;
        }

        ctx.input(|input| {
            if input.key_pressed(egui::Key::Space) {
                actions.push(ViewerAction::TogglePlay);
            }
            if input.key_pressed(egui::Key::Escape) {
                actions.push(ViewerAction::Stop);
            }
            if input.key_pressed(egui::Key::ArrowLeft) {
                actions.push(ViewerAction::Previous);
            }
            if input.key_pressed(egui::Key::ArrowRight) {
                actions.push(ViewerAction::Next);
            }
            if input.key_pressed(egui::Key::F2) {
                self.settings.show_monitor = !self.settings.show_monitor;
            }
            if input.key_pressed(egui::Key::F3) {
                self.settings.show_details = !self.settings.show_details;
            }
        });
    }

    pub fn apply_action(&mut self, action: ViewerAction) {
        trace!("Action: {:?}", action);
        match action {
            ViewerAction::SelectDate(date) => {
                if let Err(e) = self.session.select_date(&date) {
                    warn!("{}", e);
                    self.status_bar.set_message(e.to_string());
                } else {
                    self.status_bar.set_message(String::new());
                }
            }
            ViewerAction::TogglePlay => {
                let was_playing = self.session.is_playing();
                let playing = self.session.toggle_play();
                if !was_playing && !playing {
                    debug!("Play ignored, current image is {}", self.session.current_status());
                    self.status_bar.set_message("Waiting for the current image to load");
                } else {
                    self.status_bar.set_message(String::new());
                }
            }
            ViewerAction::Stop => self.session.stop(),
            ViewerAction::Next => self.session.next(),
            ViewerAction::Previous => self.session.previous(),
            ViewerAction::SelectImage(index) => {
                self.session.select_image(index);
            }
            ViewerAction::Retry => {
                if let Err(e) = self.session.retry() {
                    warn!("{}", e);
                }
            }
        }
    }
}
