//! Main application loop - eframe::App implementation.
//!
//! Contains the update() method that runs each frame:
//! - Session update (fetch results, preloading, playback tick)
//! - UI rendering (top bar, details panel, carousel, monitor)
//! - Input handling
//! - Settings persistence

use std::time::{Duration, Instant};

use eframe::egui;
use log::trace;

use super::EpicApp;
use crate::widgets::status::ProgressBar;
use crate::widgets::{ViewerAction, carousel, date_selector, details, monitor, rate_limit};

/// Repaint cadence while something is loading or playing
const ACTIVE_REPAINT: Duration = Duration::from_millis(33);

impl eframe::App for EpicApp {
    /// Main frame update - called every frame by eframe.
    ///
    /// Flow:
    /// 1. Session update
    /// 2. Keyboard input
    /// 3. Render panels, collecting actions
    /// 4. Apply actions
    /// 5. Schedule next repaint
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let frame_start = Instant::now();

        if self.session.update() {
            trace!("Session changed, repainting");
        }

        let mut actions = Vec::new();
        self.handle_keyboard_input(ctx, &mut actions);

        self.render_top_bar(ctx, &mut actions);
        self.status_bar.render(ctx, &self.session, self.last_render_time_ms);

        if self.settings.show_details && self.session.current_record().is_some() {
            egui::SidePanel::right("details_panel")
                .resizable(true)
                .default_width(300.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| details::render(ui, &self.session));
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| self.render_central(ui, &mut actions));

        if self.settings.show_monitor {
            let mut open = true;
            monitor::render(ctx, &mut open, &self.session.counts(), self.session.metrics());
            self.settings.show_monitor = open;
        }

        for action in actions {
            self.apply_action(action);
        }

        if self.session.is_busy() || self.session.is_playing() || self.session.is_dates_loading() {
            ctx.request_repaint_after(ACTIVE_REPAINT);
        }
        self.last_render_time_ms = frame_start.elapsed().as_secs_f32() * 1000.0;
    }

    /// Save settings to persistent storage.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(json) = self.settings.to_json() {
            storage.set_string(eframe::APP_KEY, json);
            trace!("Settings saved");
        }
    }
}

impl EpicApp {
    fn render_top_bar(&mut self, ctx: &egui::Context, actions: &mut Vec<ViewerAction>) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("🌍 EPIC Earth Viewer");
                ui.separator();
                date_selector::render(
                    ui,
                    self.session.available_dates(),
                    self.session.selected_date(),
                    !self.session.is_loading(),
                    actions,
                );
                if self.session.is_dates_loading() {
                    ui.spinner();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.toggle_value(&mut self.settings.show_monitor, "⚡")
                        .on_hover_text("Performance monitor (F2)");
                    ui.toggle_value(&mut self.settings.show_details, "ℹ")
                        .on_hover_text("Image details (F3)");
                    ui.separator();
                    rate_limit::render(ui, &self.session.rate_limit());
                });
            });
            ui.add_space(4.0);
        });
    }

    fn render_central(&mut self, ui: &mut egui::Ui, actions: &mut Vec<ViewerAction>) {
        if let Some(error) = self.session.error() {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 3.0);
                ui.label(egui::RichText::new("Error Loading Images").heading().color(egui::Color32::from_rgb(248, 113, 113)));
                ui.label(error.to_string());
                ui.add_space(8.0);
                if ui.button("Try Again").clicked() {
                    actions.push(ViewerAction::Retry);
                }
            });
            return;
        }

        if self.session.is_loading() {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 3.0);
                ui.spinner();
                ui.label(format!("Loading EPIC images for {}…", self.session.selected_date()));
            });
            return;
        }

        if self.session.image_set().is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 3.0);
                ui.weak("Select a date to view Earth from DSCOVR");
            });
            return;
        }

        if self.session.preload().is_busy() {
            ui.vertical_centered(|ui| {
                let mut bar = ProgressBar::new(ui.available_width().min(480.0), 14.0);
                bar.set_label("Preloading images");
                bar.set_percent(self.session.progress());
                bar.render(ui);
            });
            ui.add_space(6.0);
        }

        carousel::render(ui, &self.session, &mut self.textures, actions);
    }
}
