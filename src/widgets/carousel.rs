//! Earth carousel: current frame, caption overlay, dots and transport.
//!
//! Decoded images are uploaded to GPU textures lazily, only for frames that
//! are actually shown. Textures for identifiers outside the current set are
//! dropped on every render.

use eframe::egui;
use std::collections::HashMap;
use std::sync::Arc;

use super::ViewerAction;
use crate::core::session::Session;
use crate::core::status::{ImageHandle, LoadStatus, LoadedImage};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(96, 165, 250);
const LIVE: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);

/// "Image 3 of 12 • 2015-06-13 00:31:45"
pub fn caption_line(index: usize, len: usize, date: &str) -> String {
    format!("Image {} of {} • {}", index + 1, len, date)
}

/// "Frame Rate: 1.67 FPS" or "Frame Rate: Paused"
pub fn frame_rate_line(playing: bool, fps: f32) -> String {
    if playing {
        format!("Frame Rate: {:.2} FPS", fps)
    } else {
        "Frame Rate: Paused".to_string()
    }
}

/// GPU textures keyed by image identifier
#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<String, egui::TextureHandle>,
}

impl TextureCache {
    pub fn get_or_upload(&mut self, ctx: &egui::Context, id: &str, image: &Arc<LoadedImage>) -> egui::TextureHandle {
        self.textures
            .entry(id.to_string())
            .or_insert_with(|| {
                let size = [image.width as usize, image.height as usize];
                let color = egui::ColorImage::from_rgba_unmultiplied(size, &image.rgba);
                ctx.load_texture(format!("epic-{}", id), color, egui::TextureOptions::LINEAR)
            })
            .clone()
    }

    /// Drop textures not accepted by `keep`
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        self.textures.retain(|id, _| keep(id));
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

pub fn render(ui: &mut egui::Ui, session: &Session, textures: &mut TextureCache, actions: &mut Vec<ViewerAction>) {
    let set = session.image_set();
    textures.retain(|id| set.contains(id));

    let Some(record) = session.current_record() else {
        return;
    };
    let index = session.current_index();
    let len = set.len();

    // Square frame, as large as fits
    let avail = ui.available_size();
    let side = (avail.x).min(avail.y - 120.0).clamp(160.0, 900.0);

    ui.vertical_centered(|ui| {
        let (rect, _) = ui.allocate_exact_size(egui::vec2(side, side), egui::Sense::hover());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 8.0, egui::Color32::BLACK);

        match session.current_handle() {
            Some(ImageHandle::Decoded(image)) => {
                let texture = textures.get_or_upload(ui.ctx(), &record.identifier, image);
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
            }
            Some(ImageHandle::Fallback(url)) => {
                painter.text(
                    rect.center() - egui::vec2(0.0, 14.0),
                    egui::Align2::CENTER_CENTER,
                    "Image could not be loaded",
                    egui::FontId::proportional(16.0),
                    egui::Color32::from_gray(200),
                );
                painter.text(
                    rect.center() + egui::vec2(0.0, 10.0),
                    egui::Align2::CENTER_CENTER,
                    url,
                    egui::FontId::monospace(10.0),
                    egui::Color32::from_gray(140),
                );
            }
            None => {
                let label = match session.current_status() {
                    LoadStatus::Loading => "Loading image…",
                    _ => "Waiting for image…",
                };
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    label,
                    egui::FontId::proportional(16.0),
                    egui::Color32::from_gray(160),
                );
            }
        }

        // Caption overlay
        let band = egui::Rect::from_min_max(egui::pos2(rect.min.x, rect.max.y - 64.0), rect.max);
        painter.rect_filled(band, 0.0, egui::Color32::from_black_alpha(170));
        painter.text(
            band.left_top() + egui::vec2(16.0, 10.0),
            egui::Align2::LEFT_TOP,
            &record.caption,
            egui::FontId::proportional(14.0),
            egui::Color32::WHITE,
        );
        painter.text(
            band.left_top() + egui::vec2(16.0, 34.0),
            egui::Align2::LEFT_TOP,
            caption_line(index, len, &record.date),
            egui::FontId::proportional(12.0),
            ACCENT,
        );

        if session.is_playing() {
            let badge = egui::Rect::from_min_size(rect.right_top() + egui::vec2(-84.0, 12.0), egui::vec2(70.0, 24.0));
            painter.rect_filled(badge, 12.0, LIVE);
            painter.text(
                badge.center(),
                egui::Align2::CENTER_CENTER,
                "● LIVE",
                egui::FontId::proportional(12.0),
                egui::Color32::WHITE,
            );
        }

        ui.add_space(8.0);
        render_dots(ui, len, index, actions);
        ui.add_space(8.0);
        render_transport(ui, session, len, actions);
        ui.add_space(6.0);

        ui.label(
            egui::RichText::new(format!(
                "Showing Earth's rotation over {} images captured on {}",
                len,
                set.date()
            ))
            .color(ACCENT),
        );
        ui.label(
            egui::RichText::new(format!(
                "{} • Source: DSCOVR Satellite",
                frame_rate_line(session.is_playing(), session.sequencer().frame_rate())
            ))
            .small()
            .weak(),
        );
    });
}

fn render_dots(ui: &mut egui::Ui, len: usize, current: usize, actions: &mut Vec<ViewerAction>) {
    const DOT: f32 = 8.0;
    const ACTIVE: f32 = 28.0;
    const GAP: f32 = 6.0;

    let total = len.saturating_sub(1) as f32 * (DOT + GAP) + ACTIVE;
    let (row, _) = ui.allocate_exact_size(egui::vec2(total, DOT + 4.0), egui::Sense::hover());

    let mut x = row.min.x;
    for i in 0..len {
        let width = if i == current { ACTIVE } else { DOT };
        let rect = egui::Rect::from_min_size(egui::pos2(x, row.min.y + 2.0), egui::vec2(width, DOT));
        let response = ui.interact(rect, ui.id().with(("dot", i)), egui::Sense::click());

        let color = if i == current {
            ACCENT
        } else if response.hovered() {
            egui::Color32::from_white_alpha(130)
        } else {
            egui::Color32::from_white_alpha(75)
        };
        ui.painter().rect_filled(rect, DOT / 2.0, color);

        if response.clicked() {
            actions.push(ViewerAction::SelectImage(i));
        }
        x += width + GAP;
    }
}

fn render_transport(ui: &mut egui::Ui, session: &Session, len: usize, actions: &mut Vec<ViewerAction>) {
    let can_step = len > 1;
    let play_label = if session.is_playing() { "⏸" } else { "▶" };

    ui.horizontal(|ui| {
        // Center three buttons
        let width = 3.0 * 44.0 + 2.0 * ui.spacing().item_spacing.x;
        ui.add_space(((ui.available_width() - width) / 2.0).max(0.0));

        if ui
            .add_enabled(can_step, egui::Button::new("⏮").min_size(egui::vec2(44.0, 32.0)))
            .on_hover_text("Previous (Left)")
            .clicked()
        {
            actions.push(ViewerAction::Previous);
        }
        if ui
            .add(egui::Button::new(play_label).min_size(egui::vec2(44.0, 32.0)))
            .on_hover_text("Play/Pause (Space)")
            .clicked()
        {
            actions.push(ViewerAction::TogglePlay);
        }
        if ui
            .add_enabled(can_step, egui::Button::new("⏭").min_size(egui::vec2(44.0, 32.0)))
            .on_hover_text("Next (Right)")
            .clicked()
        {
            actions.push(ViewerAction::Next);
        }
    });
}
