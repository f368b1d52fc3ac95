//! Performance monitor window (toggle with F2).

use eframe::egui;
use std::time::Duration;

use crate::core::metrics::{LoadCounts, PreloadMetrics};

/// "1.24s", "380ms", "-" when not reached yet
pub fn format_timing(value: Option<Duration>) -> String {
    match value {
        Some(d) if d >= Duration::from_secs(1) => format!("{:.2}s", d.as_secs_f32()),
        Some(d) => format!("{}ms", d.as_millis()),
        None => "-".to_string(),
    }
}

pub fn render(ctx: &egui::Context, open: &mut bool, counts: &LoadCounts, metrics: &PreloadMetrics) {
    egui::Window::new("⚡ Performance Monitor")
        .open(open)
        .resizable(false)
        .default_width(220.0)
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -40.0))
        .show(ctx, |ui| {
            egui::Grid::new("perf_counts").num_columns(2).striped(true).show(ui, |ui| {
                ui.label("Total Images:");
                ui.monospace(counts.total.to_string());
                ui.end_row();
                ui.label("Loaded:");
                ui.colored_label(egui::Color32::from_rgb(74, 222, 128), counts.loaded.to_string());
                ui.end_row();
                ui.label("Loading:");
                ui.colored_label(egui::Color32::from_rgb(250, 204, 21), counts.loading.to_string());
                ui.end_row();
                ui.label("Queued:");
                ui.monospace(counts.not_started.to_string());
                ui.end_row();
                ui.label("Errors:");
                ui.colored_label(egui::Color32::from_rgb(248, 113, 113), counts.error.to_string());
                ui.end_row();
            });

            ui.separator();

            egui::Grid::new("perf_timings").num_columns(2).show(ui, |ui| {
                ui.label("First Image:");
                ui.monospace(format_timing(metrics.time_to_first_image()));
                ui.end_row();
                ui.label("All Images:");
                ui.monospace(format_timing(metrics.time_to_all_images()));
                ui.end_row();
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timing() {
        assert_eq!(format_timing(None), "-");
        assert_eq!(format_timing(Some(Duration::from_millis(380))), "380ms");
        assert_eq!(format_timing(Some(Duration::from_millis(1240))), "1.24s");
    }
}
