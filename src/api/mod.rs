//! EPIC backend boundary.
//!
//! The core only sees two traits:
//! - [`EpicBackend`]: date list and per-date metadata (JSON)
//! - [`ImageLoader`]: per-image payload, fetched and decoded
//!
//! Both are blocking and run on [`crate::core::Workers`] threads.
//! [`ApiClient`] implements both against the HTTP API:
//!
//! | Method | Path                                   | Description          |
//! |--------|----------------------------------------|----------------------|
//! | GET    | `/api/v1/epic/available-dates`         | Date list            |
//! | GET    | `/api/v1/epic/?date=YYYY-MM-DD`        | Image records        |
//! | GET    | `/api/v1/epic/image/{date}/{imageKey}` | Image payload        |
//! | GET    | `/epic/images/{imageKey}.png`          | Archive (fallback)   |

mod client;

pub use client::ApiClient;

use crate::core::status::LoadedImage;
use crate::entities::{ImageRecord, RateLimitState};
use crate::error::Result;

/// Response payload plus quota headers, if the backend sent them
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub rate_limit: Option<RateLimitState>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, rate_limit: None }
    }

    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimitState>) -> Self {
        self.rate_limit = rate_limit;
        self
    }
}

/// Metadata source
pub trait EpicBackend: Send + Sync {
    /// Raw date strings as returned by the backend (normalized by the caller)
    fn available_dates(&self) -> Result<ApiResponse<Vec<String>>>;

    /// Image records for one `YYYY-MM-DD` date, in capture order
    fn image_set(&self, date: &str) -> Result<ApiResponse<Vec<ImageRecord>>>;
}

/// Image payload source
pub trait ImageLoader: Send + Sync {
    /// Fetch and decode one image. Errors are recovered by the preloader.
    fn load(&self, record: &ImageRecord, date: &str) -> Result<LoadedImage>;

    /// Direct URL the display can still try when `load` failed
    fn fallback_url(&self, record: &ImageRecord, date: &str) -> String;
}
