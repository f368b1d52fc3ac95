use eframe::egui;

/// Progress bar widget for metadata and image preloading
pub struct ProgressBar {
    /// Percent in [0, 100]
    percent: f32,
    label: Option<String>,
    width: f32,
    height: f32,
    fill_color: egui::Color32,
}

impl ProgressBar {
    /// Default fill color: EPIC blue
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_color(width, height, egui::Color32::from_rgb(59, 130, 246))
    }

    pub fn with_color(width: f32, height: f32, fill_color: egui::Color32) -> Self {
        Self {
            percent: 0.0,
            label: None,
            width,
            height,
            fill_color,
        }
    }

    pub fn set_percent(&mut self, percent: f32) {
        self.percent = percent.clamp(0.0, 100.0);
    }

    /// Text drawn over the bar instead of the percentage
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    pub fn text(&self) -> String {
        match &self.label {
            Some(label) => format!("{} {:.0}%", label, self.percent),
            None => format!("{:.0}%", self.percent),
        }
    }

    pub fn render(&self, ui: &mut egui::Ui) {
        let (rect, _response) =
            ui.allocate_exact_size(egui::vec2(self.width, self.height), egui::Sense::hover());

        ui.painter().rect_filled(rect, 3.0, egui::Color32::from_gray(40));

        if self.percent > 0.0 {
            let fill_width = rect.width() * self.percent / 100.0;
            let fill_rect = egui::Rect::from_min_size(rect.min, egui::vec2(fill_width, rect.height()));
            ui.painter().rect_filled(fill_rect, 3.0, self.fill_color);
        }

        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            self.text(),
            egui::FontId::monospace(11.0),
            egui::Color32::from_gray(230),
        );
    }
}
