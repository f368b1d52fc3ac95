//! Per-image load state and cached resource handles.

use std::fmt;
use std::sync::Arc;

/// Image loading status
///
/// Transitions: NotStarted -> Loading -> Loaded | Error.
/// `Loaded` and `Error` are terminal for a given image set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadStatus {
    #[default]
    NotStarted,
    Loading,
    Loaded,
    Error,
}

impl LoadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadStatus::Loaded | LoadStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoadStatus::NotStarted => "not-started",
            LoadStatus::Loading => "loading",
            LoadStatus::Loaded => "loaded",
            LoadStatus::Error => "error",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded RGBA8 pixels
#[derive(Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl LoadedImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self { width, height, rgba }
    }
}

// Pixel buffers are large, keep Debug output short
impl fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Locally resolvable resource for a settled image
#[derive(Debug, Clone)]
pub enum ImageHandle {
    /// Successfully fetched and decoded
    Decoded(Arc<LoadedImage>),
    /// Load failed; direct URL the display can still try
    Fallback(String),
}

impl ImageHandle {
    pub fn decoded(&self) -> Option<&Arc<LoadedImage>> {
        match self {
            ImageHandle::Decoded(img) => Some(img),
            ImageHandle::Fallback(_) => None,
        }
    }

    pub fn fallback_url(&self) -> Option<&str> {
        match self {
            ImageHandle::Decoded(_) => None,
            ImageHandle::Fallback(url) => Some(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!LoadStatus::NotStarted.is_terminal());
        assert!(!LoadStatus::Loading.is_terminal());
        assert!(LoadStatus::Loaded.is_terminal());
        assert!(LoadStatus::Error.is_terminal());
        assert_eq!(LoadStatus::default(), LoadStatus::NotStarted);
        assert_eq!(LoadStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_handle_accessors() {
        let img = Arc::new(LoadedImage::new(1, 1, vec![0, 0, 0, 255]));
        let h = ImageHandle::Decoded(img);
        assert!(h.decoded().is_some());
        assert!(h.fallback_url().is_none());

        let h = ImageHandle::Fallback("http://x/epic/images/a.png".into());
        assert_eq!(h.fallback_url(), Some("http://x/epic/images/a.png"));
    }
}
