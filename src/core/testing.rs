//! Test doubles for the backend traits.

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::api::{ApiResponse, EpicBackend, ImageLoader};
use crate::core::status::LoadedImage;
use crate::entities::{ImageRecord, RateLimitState};
use crate::error::{EpicError, Result};

/// What the mock loader does for one identifier
#[derive(Debug, Clone, Copy)]
pub enum Plan {
    Ok(Duration),
    Fail(Duration),
}

/// Image loader with per-identifier delay/failure plans.
/// Unplanned identifiers load instantly.
#[derive(Default)]
pub struct MockLoader {
    plans: Mutex<HashMap<String, Plan>>,
    calls: Mutex<Vec<String>>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(self, id: &str, plan: Plan) -> Self {
        self.plans.lock().unwrap().insert(id.to_string(), plan);
        self
    }

    pub fn call_count(&self, id: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == id).count()
    }
}

impl ImageLoader for MockLoader {
    fn load(&self, record: &ImageRecord, _date: &str) -> Result<LoadedImage> {
        self.calls.lock().unwrap().push(record.identifier.clone());
        let plan = self
            .plans
            .lock()
            .unwrap()
            .get(&record.identifier)
            .copied()
            .unwrap_or(Plan::Ok(Duration::ZERO));

        match plan {
            Plan::Ok(delay) => {
                thread::sleep(delay);
                Ok(LoadedImage::new(2, 2, vec![255; 16]))
            }
            Plan::Fail(delay) => {
                thread::sleep(delay);
                Err(EpicError::ImageLoad {
                    id: record.identifier.clone(),
                    reason: "HTTP error! status: 404".to_string(),
                })
            }
        }
    }

    fn fallback_url(&self, record: &ImageRecord, _date: &str) -> String {
        format!("http://fallback/epic/images/{}.png", record.image)
    }
}

/// Metadata backend with canned responses
pub struct MockBackend {
    pub dates: Result<Vec<String>>,
    pub sets: Mutex<HashMap<String, Result<Vec<ImageRecord>>>>,
    pub rate_limit: Option<RateLimitState>,
    pub delay: Duration,
}

impl MockBackend {
    pub fn new(dates: Vec<&str>) -> Self {
        Self {
            dates: Ok(dates.into_iter().map(String::from).collect()),
            sets: Mutex::new(HashMap::new()),
            rate_limit: None,
            delay: Duration::ZERO,
        }
    }

    pub fn with_set(self, date: &str, result: Result<Vec<ImageRecord>>) -> Self {
        self.sets.lock().unwrap().insert(date.to_string(), result);
        self
    }
}

impl EpicBackend for MockBackend {
    fn available_dates(&self) -> Result<ApiResponse<Vec<String>>> {
        thread::sleep(self.delay);
        self.dates
            .clone()
            .map(|d| ApiResponse::new(d).with_rate_limit(self.rate_limit))
    }

    fn image_set(&self, date: &str) -> Result<ApiResponse<Vec<ImageRecord>>> {
        thread::sleep(self.delay);
        self.sets
            .lock()
            .unwrap()
            .get(date)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(|records| ApiResponse::new(records).with_rate_limit(self.rate_limit))
    }
}
