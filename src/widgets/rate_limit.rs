//! API quota badge for the top bar.

use eframe::egui;

use crate::entities::RateLimitState;

const OK_COLOR: egui::Color32 = egui::Color32::from_rgb(34, 197, 94);
const LOW_COLOR: egui::Color32 = egui::Color32::from_rgb(245, 158, 11);

/// "1,234 / 2,000"
pub fn usage_text(state: &RateLimitState) -> String {
    format!("{} / {}", group_thousands(state.used), group_thousands(state.total))
}

/// "38% remaining"
pub fn remaining_text(state: &RateLimitState) -> String {
    format!("{:.0}% remaining", state.remaining_percent())
}

fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn render(ui: &mut egui::Ui, state: &RateLimitState) {
    let color = if state.is_low() { LOW_COLOR } else { OK_COLOR };
    let icon = if state.is_low() { "⚠" } else { "✔" };

    ui.vertical(|ui| {
        ui.horizontal(|ui| {
            ui.colored_label(color, icon);
            ui.label(egui::RichText::new("API Requests").strong());
            ui.label(egui::RichText::new(usage_text(state)).monospace());
            ui.label(egui::RichText::new(remaining_text(state)).small().weak());
        });

        let (rect, _) = ui.allocate_exact_size(egui::vec2(220.0, 4.0), egui::Sense::hover());
        ui.painter().rect_filled(rect, 2.0, egui::Color32::from_white_alpha(25));
        let fill = rect.width() * (state.percentage() / 100.0).clamp(0.0, 1.0);
        if fill > 0.0 {
            let fill_rect = egui::Rect::from_min_size(rect.min, egui::vec2(fill, rect.height()));
            ui.painter().rect_filled(fill_rect, 2.0, color);
        }
    });
}
