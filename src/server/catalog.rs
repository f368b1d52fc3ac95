//! In-memory EPIC catalog with synthetic Earth frames.

use chrono::{Days, NaiveDate};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use log::warn;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Cursor;
use std::sync::Arc;

use crate::entities::date::date_key;
use crate::entities::{Coordinates, ImageRecord, Position};

/// Demo frame edge length (px)
const DEMO_FRAME_SIZE: u32 = 96;
/// EPIC captures roughly every 2 hours during the day
const DEMO_CAPTURE_STEP_MIN: u32 = 108;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    dates: BTreeMap<String, Vec<ImageRecord>>,
    images: HashMap<String, Arc<Vec<u8>>>,
    missing: HashSet<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register records for a date (replaces previous ones)
    pub fn insert(&mut self, date: &str, records: Vec<ImageRecord>) {
        self.dates.insert(date.to_string(), records);
    }

    /// Register encoded payload for an image key
    pub fn insert_image(&mut self, image_key: &str, bytes: Vec<u8>) {
        self.images.insert(image_key.to_string(), Arc::new(bytes));
    }

    /// Primary endpoint answers 404 for this key; the archive path still works.
    pub fn mark_missing(&mut self, image_key: &str) {
        self.missing.insert(image_key.to_string());
    }

    /// Dates, newest first
    pub fn dates(&self) -> Vec<String> {
        self.dates.keys().rev().cloned().collect()
    }

    pub fn records(&self, date: &str) -> &[ImageRecord] {
        self.dates.get(date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Payload served by `/api/v1/epic/image/...`
    pub fn image(&self, image_key: &str) -> Option<Arc<Vec<u8>>> {
        if self.missing.contains(image_key) {
            return None;
        }
        self.archive_image(image_key)
    }

    /// Payload served by `/epic/images/{key}.png`
    pub fn archive_image(&self, image_key: &str) -> Option<Arc<Vec<u8>>> {
        self.images.get(image_key).cloned()
    }

    /// Synthetic catalog: `num_dates` consecutive days from 2015-06-13,
    /// `per_date` frames each, Earth disc rotating between frames.
    pub fn demo(num_dates: usize, per_date: usize) -> Self {
        let mut catalog = Self::new();
        let Some(first) = NaiveDate::from_ymd_opt(2015, 6, 13) else {
            return catalog;
        };

        for day in 0..num_dates {
            let Some(date) = first.checked_add_days(Days::new(day as u64)) else {
                break;
            };
            let date = date.format("%Y-%m-%d").to_string();
            let key = date_key(&date);

            let mut records = Vec::with_capacity(per_date);
            for frame in 0..per_date {
                let minutes = 31 + frame as u32 * DEMO_CAPTURE_STEP_MIN;
                let stamp = format!("{}{:02}{:02}{:02}", key, minutes / 60 % 24, minutes % 60, 45);
                let lon = 165.0 - frame as f64 * 27.0;
                let record = ImageRecord {
                    identifier: stamp.clone(),
                    caption: "This image was taken by NASA's EPIC camera onboard the NOAA DSCOVR spacecraft"
                        .to_string(),
                    date: format!("{} {:02}:{:02}:45", date, minutes / 60 % 24, minutes % 60),
                    image: format!("epic_1b_{}", stamp),
                    centroid_coordinates: Coordinates { lat: 11.65, lon },
                    dscovr_j2000_position: Position {
                        x: -1_283_061.0 + frame as f64 * 1_500.0,
                        y: -669_893.0 + frame as f64 * 2_100.0,
                        z: -130_240.0,
                    },
                };

                match render_demo_frame(frame, per_date) {
                    Ok(png) => catalog.insert_image(&record.image, png),
                    Err(e) => warn!("Demo frame {} not rendered: {}", record.image, e),
                }
                records.push(record);
            }
            catalog.insert(&date, records);
        }
        catalog
    }
}

/// Earth-ish disc with a terminator that moves with `frame`.
fn render_demo_frame(frame: usize, total: usize) -> Result<Vec<u8>, image::ImageError> {
    let size = DEMO_FRAME_SIZE as f32;
    let center = size / 2.0;
    let radius = size * 0.42;
    let phase = frame as f32 / total.max(1) as f32 * std::f32::consts::TAU;

    let img = RgbaImage::from_fn(DEMO_FRAME_SIZE, DEMO_FRAME_SIZE, |x, y| {
        let dx = (x as f32 - center) / radius;
        let dy = (y as f32 - center) / radius;
        let d2 = dx * dx + dy * dy;
        if d2 > 1.0 {
            return Rgba([0, 0, 0, 255]);
        }
        // Longitude across the disc, shifted per frame
        let lon = dx.asin() + phase;
        let land = (lon * 3.0).sin() * (dy * 4.0).cos() > 0.35;
        let shade = (1.0 - d2).sqrt().clamp(0.2, 1.0);
        let (r, g, b) = if land { (70.0, 120.0, 60.0) } else { (30.0, 70.0, 160.0) };
        Rgba([(r * shade) as u8, (g * shade) as u8, (b * shade) as u8, 255])
    });

    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
