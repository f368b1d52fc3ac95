//! Image details side panel.

use eframe::egui;

use crate::core::session::Session;
use crate::entities::{Coordinates, Position};

const HEADING: egui::Color32 = egui::Color32::from_rgb(147, 197, 253);

/// Latitude/longitude with two decimals: ("11.65°", "-165.37°")
pub fn format_coordinates(c: &Coordinates) -> (String, String) {
    (format!("{:.2}°", c.lat), format!("{:.2}°", c.lon))
}

/// Satellite position in whole kilometres
pub fn format_position(p: &Position) -> [String; 3] {
    [p.x, p.y, p.z].map(|v| format!("{:.0} km", v))
}

fn section(ui: &mut egui::Ui, title: &str) {
    ui.add_space(6.0);
    ui.separator();
    ui.label(egui::RichText::new(title.to_uppercase()).small().strong().color(HEADING));
}

pub fn render(ui: &mut egui::Ui, session: &Session) {
    ui.heading("Image Details");

    let Some(record) = session.current_record() else {
        ui.weak("No image selected");
        return;
    };

    section(ui, "Current image");
    ui.label(egui::RichText::new(&record.caption).strong());
    egui::Grid::new("details_current").num_columns(2).show(ui, |ui| {
        ui.weak("Identifier:");
        ui.monospace(&record.identifier);
        ui.end_row();
        ui.weak("Date:");
        ui.label(&record.date);
        ui.end_row();
    });

    section(ui, "Earth coordinates");
    let (lat, lon) = format_coordinates(&record.centroid_coordinates);
    egui::Grid::new("details_coords").num_columns(2).show(ui, |ui| {
        ui.weak("Latitude");
        ui.weak("Longitude");
        ui.end_row();
        ui.monospace(lat);
        ui.monospace(lon);
        ui.end_row();
    });

    section(ui, "Satellite position");
    let [x, y, z] = format_position(&record.dscovr_j2000_position);
    egui::Grid::new("details_position").num_columns(2).show(ui, |ui| {
        for (axis, value) in [("X:", x), ("Y:", y), ("Z:", z)] {
            ui.weak(axis);
            ui.monospace(value);
            ui.end_row();
        }
    });

    section(ui, "Session info");
    let (status, color) = if session.is_playing() {
        ("Playing", egui::Color32::from_rgb(74, 222, 128))
    } else {
        ("Paused", egui::Color32::from_rgb(250, 204, 21))
    };
    egui::Grid::new("details_session").num_columns(2).show(ui, |ui| {
        ui.weak("Total Images:");
        ui.label(session.image_set().len().to_string());
        ui.end_row();
        ui.weak("Current Frame:");
        ui.label((session.current_index() + 1).to_string());
        ui.end_row();
        ui.weak("Image Status:");
        ui.label(session.current_status().as_str());
        ui.end_row();
        ui.weak("Status:");
        ui.colored_label(color, status);
        ui.end_row();
    });
}
