//! EPIC image metadata and the per-date image set.
//!
//! Records come straight from `GET /api/v1/epic/?date=...` and are never
//! mutated afterwards. An [`ImageSet`] is replaced wholesale on date change.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::date::date_key;

/// Earth centroid seen by the camera (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// DSCOVR satellite position, J2000 frame (km)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Single EPIC capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub identifier: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub date: String,
    /// Image key (filename without extension), e.g. `epic_1b_20150613003633`
    pub image: String,
    #[serde(default)]
    pub centroid_coordinates: Coordinates,
    #[serde(default)]
    pub dscovr_j2000_position: Position,
}

impl ImageRecord {
    /// Whether the image key embeds the given observation date.
    pub fn belongs_to(&self, date: &str) -> bool {
        self.image.contains(&date_key(date))
    }
}

/// Ordered, immutable collection of records for one date.
///
/// Cloning is cheap (shared records).
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    date: String,
    records: Arc<[ImageRecord]>,
}

impl ImageSet {
    pub fn new(date: impl Into<String>, records: Vec<ImageRecord>) -> Self {
        Self {
            date: date.into(),
            records: records.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&ImageRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.records.iter().any(|r| r.identifier == identifier)
    }

    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.records.iter().position(|r| r.identifier == identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
pub(crate) fn record(id: &str, image: &str) -> ImageRecord {
    ImageRecord {
        identifier: id.to_string(),
        caption: format!("caption {}", id),
        date: "2015-06-13 00:31:45".to_string(),
        image: image.to_string(),
        centroid_coordinates: Coordinates { lat: 12.5, lon: -160.25 },
        dscovr_j2000_position: Position { x: -1_283_061.0, y: -669_893.0, z: -130_240.0 },
    }
}
