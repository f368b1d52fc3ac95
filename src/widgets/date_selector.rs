//! Date picker: combo box over the backend's available dates.

use eframe::egui;

use super::ViewerAction;
use crate::entities::date::format_display_date;

/// Entry label: "Saturday, June 13, 2015 (2015-06-13)"
pub fn entry_label(date: &str) -> String {
    let display = format_display_date(date);
    if display == date {
        return date.to_string();
    }
    format!("{} ({})", display, date)
}

/// Render the selector. `selected` may be missing from `dates` (default date).
pub fn render(
    ui: &mut egui::Ui,
    dates: &[String],
    selected: &str,
    enabled: bool,
    actions: &mut Vec<ViewerAction>,
) {
    ui.add_enabled_ui(enabled, |ui| {
        ui.horizontal(|ui| {
            ui.label("📅");
            egui::ComboBox::from_id_salt("epic_date_selector")
                .width(300.0)
                .selected_text(entry_label(selected))
                .show_ui(ui, |ui| {
                    if dates.is_empty() {
                        ui.weak("No dates available");
                    }
                    for date in dates {
                        let is_selected = date == selected;
                        if ui.selectable_label(is_selected, entry_label(date)).clicked() && !is_selected {
                            actions.push(ViewerAction::SelectDate(date.clone()));
                        }
                    }
                });
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_label() {
        assert_eq!(entry_label("2015-06-13"), "Saturday, June 13, 2015 (2015-06-13)");
        assert_eq!(entry_label("garbage"), "garbage");
    }
}
