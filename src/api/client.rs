//! Blocking HTTP client for the EPIC backend (ureq).

use log::{debug, trace, warn};
use std::io::Read;
use std::time::Duration;

use super::{ApiResponse, EpicBackend, ImageLoader};
use crate::core::status::LoadedImage;
use crate::entities::rate_limit::{HEADER_LIMIT, HEADER_REMAINING};
use crate::entities::{ImageRecord, RateLimitState};
use crate::error::{EpicError, Result};

/// Upper bound for a single image payload (EPIC PNGs are ~3 MB at 2048x2048)
const MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

/// HTTP client bound to one backend base URL
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish()
    }
}

impl ApiClient {
    /// Create client for `base_url` (e.g. `http://localhost:8080`).
    ///
    /// `timeout` bounds connect and read separately.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn dates_url(&self) -> String {
        format!("{}/api/v1/epic/available-dates", self.base_url)
    }

    pub fn image_set_url(&self) -> String {
        format!("{}/api/v1/epic/", self.base_url)
    }

    /// Primary image endpoint
    pub fn image_url(&self, date: &str, image_key: &str) -> String {
        format!("{}/api/v1/epic/image/{}/{}", self.base_url, date, image_key)
    }

    /// Static archive path, used as the fallback for failed loads
    pub fn archive_url(&self, image_key: &str) -> String {
        format!("{}/epic/images/{}.png", self.base_url, image_key)
    }

    fn get(&self, url: &str, query: Option<(&str, &str)>) -> Result<ureq::Response> {
        trace!("GET {} {:?}", url, query);
        let mut request = self.agent.get(url);
        if let Some((key, value)) = query {
            request = request.query(key, value);
        }
        match request.call() {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(status, _)) => {
                debug!("GET {} -> {}", url, status);
                Err(EpicError::Http { status })
            }
            Err(e) => Err(EpicError::Network(e.to_string())),
        }
    }

    fn rate_limit(resp: &ureq::Response) -> Option<RateLimitState> {
        RateLimitState::from_headers(resp.header(HEADER_LIMIT), resp.header(HEADER_REMAINING))
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.get(url, None)?;
        let mut bytes = Vec::new();
        resp.into_reader()
            .take(MAX_IMAGE_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| EpicError::Network(format!("reading {}: {}", url, e)))?;
        Ok(bytes)
    }
}

/// Decode an encoded image payload into RGBA8.
pub fn decode_image(bytes: &[u8]) -> std::result::Result<LoadedImage, image::ImageError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(LoadedImage::new(width, height, rgba.into_raw()))
}

impl EpicBackend for ApiClient {
    fn available_dates(&self) -> Result<ApiResponse<Vec<String>>> {
        let resp = self.get(&self.dates_url(), None)?;
        let rate_limit = Self::rate_limit(&resp);
        let dates: Vec<String> = resp
            .into_json()
            .map_err(|e| EpicError::InvalidResponse(format!("available dates: {}", e)))?;
        debug!("Fetched {} available dates", dates.len());
        Ok(ApiResponse::new(dates).with_rate_limit(rate_limit))
    }

    fn image_set(&self, date: &str) -> Result<ApiResponse<Vec<ImageRecord>>> {
        let resp = self.get(&self.image_set_url(), Some(("date", date)))?;
        let rate_limit = Self::rate_limit(&resp);
        let records: Vec<ImageRecord> = resp
            .into_json()
            .map_err(|e| EpicError::InvalidResponse(format!("images for {}: {}", date, e)))?;
        debug!("Fetched {} image records for {}", records.len(), date);
        Ok(ApiResponse::new(records).with_rate_limit(rate_limit))
    }
}

impl ImageLoader for ApiClient {
    fn load(&self, record: &ImageRecord, date: &str) -> Result<LoadedImage> {
        let url = self.image_url(date, &record.image);
        let to_load_error = |reason: String| EpicError::ImageLoad {
            id: record.identifier.clone(),
            reason,
        };

        let bytes = self.fetch_bytes(&url).map_err(|e| to_load_error(e.to_string()))?;
        decode_image(&bytes).map_err(|e| {
            warn!("Undecodable payload for {} ({} bytes): {}", record.identifier, bytes.len(), e);
            to_load_error(e.to_string())
        })
    }

    fn fallback_url(&self, record: &ImageRecord, _date: &str) -> String {
        self.archive_url(&record.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{Catalog, EpicServer};

    fn client_for(server: &EpicServer) -> ApiClient {
        ApiClient::new(&server.base_url(), Duration::from_secs(5))
    }

    #[test]
    fn test_urls() {
        let client = ApiClient::new("http://localhost:8080/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.image_url("2015-06-13", "epic_1b_20150613003633"),
            "http://localhost:8080/api/v1/epic/image/2015-06-13/epic_1b_20150613003633"
        );
        assert_eq!(
            client.archive_url("epic_1b_20150613003633"),
            "http://localhost:8080/epic/images/epic_1b_20150613003633.png"
        );
    }

    #[test]
    fn test_available_dates_with_rate_limit() {
        let server = EpicServer::start("127.0.0.1:0", Catalog::demo(3, 4)).unwrap();
        let client = client_for(&server);

        let resp = client.available_dates().unwrap();
        assert_eq!(resp.data.len(), 3);
        let rl = resp.rate_limit.expect("rate limit headers");
        assert_eq!(rl.total, server.rate_limit_total());
        assert_eq!(rl.used, 1);
    }

    #[test]
    fn test_image_set_and_image() {
        let catalog = Catalog::demo(1, 3);
        let date = catalog.dates()[0].clone();
        let server = EpicServer::start("127.0.0.1:0", catalog).unwrap();
        let client = client_for(&server);

        let set = client.image_set(&date).unwrap().data;
        assert_eq!(set.len(), 3);
        assert!(set.iter().all(|r| r.belongs_to(&date)));

        let img = client.load(&set[0], &date).unwrap();
        assert!(img.width > 0 && img.height > 0);
        assert_eq!(img.rgba.len(), (img.width * img.height * 4) as usize);
    }

    #[test]
    fn test_unknown_date_is_empty() {
        let server = EpicServer::start("127.0.0.1:0", Catalog::demo(1, 2)).unwrap();
        let client = client_for(&server);
        let set = client.image_set("1999-01-01").unwrap().data;
        assert!(set.is_empty());
    }

    #[test]
    fn test_missing_image_is_load_error() {
        let mut catalog = Catalog::demo(1, 2);
        let date = catalog.dates()[0].clone();
        let broken = catalog.records(&date)[1].clone();
        catalog.mark_missing(&broken.image);
        let server = EpicServer::start("127.0.0.1:0", catalog).unwrap();
        let client = client_for(&server);

        match client.load(&broken, &date) {
            Err(EpicError::ImageLoad { id, reason }) => {
                assert_eq!(id, broken.identifier);
                assert!(reason.contains("404"));
            }
            other => panic!("expected ImageLoad error, got {:?}", other),
        }
        assert!(client.fallback_url(&broken, &date).ends_with(".png"));
    }

    #[test]
    fn test_connection_refused_is_network_error() {
        // Grab a free port, then release it so nothing listens there
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = ApiClient::new(&format!("http://127.0.0.1:{}", port), Duration::from_secs(2));
        assert!(matches!(client.available_dates(), Err(EpicError::Network(_))));
    }
}
