//! rouille handlers for the embedded EPIC backend.
//!
//! # Thread safety
//!
//! - `Catalog` is read-only once the server starts
//! - Request counter is atomic; every request consumes one unit of quota
//!   and the remaining quota is reported via `X-RateLimit-*` headers

use anyhow::{Result, anyhow};
use rouille::{Request, Response};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::catalog::Catalog;
use crate::entities::rate_limit::{HEADER_LIMIT, HEADER_REMAINING};

/// Server tuning
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Quota reported in `X-RateLimit-Limit`
    pub rate_limit_total: u32,
    /// Artificial delay for image payloads (makes progressive loading visible)
    pub image_latency: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            rate_limit_total: 1000,
            image_latency: Duration::ZERO,
        }
    }
}

struct ServerState {
    catalog: Catalog,
    options: ServerOptions,
    requests: AtomicU32,
}

/// Generic error body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Running backend; stops when dropped.
pub struct EpicServer {
    addr: SocketAddr,
    rate_limit_total: u32,
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl EpicServer {
    /// Bind `addr` (use port 0 for an ephemeral port) and serve `catalog`.
    pub fn start(addr: &str, catalog: Catalog) -> Result<Self> {
        Self::start_with(addr, catalog, ServerOptions::default())
    }

    pub fn start_with(addr: &str, catalog: Catalog, options: ServerOptions) -> Result<Self> {
        let rate_limit_total = options.rate_limit_total;
        let state = Arc::new(ServerState {
            catalog,
            options,
            requests: AtomicU32::new(0),
        });

        let server = rouille::Server::new(addr, move |request| handle_request(request, &state))
            .map_err(|e| anyhow!("Failed to bind EPIC mock server on {}: {}", addr, e))?;
        let addr = server.server_addr();
        log::info!("EPIC mock server listening on http://{}", addr);

        let (handle, stop_tx) = server.stoppable();
        Ok(Self {
            addr,
            rate_limit_total,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn rate_limit_total(&self) -> u32 {
        self.rate_limit_total
    }
}

impl Drop for EpicServer {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        log::debug!("EPIC mock server on {} stopped", self.addr);
    }
}

fn handle_request(request: &Request, state: &ServerState) -> Response {
    let used = state.requests.fetch_add(1, Ordering::SeqCst) + 1;
    let total = state.options.rate_limit_total;
    let remaining = total.saturating_sub(used);

    route(request, state)
        .with_additional_header(HEADER_LIMIT, total.to_string())
        .with_additional_header(HEADER_REMAINING, remaining.to_string())
        .with_additional_header("Access-Control-Allow-Origin", "*")
}

fn route(request: &Request, state: &ServerState) -> Response {
    if request.method() != "GET" {
        return error(405, "Method not allowed");
    }

    // Paths with parameters handled manually
    let path = request.url();
    if let Some(rest) = path.strip_prefix("/api/v1/epic/image/") {
        let Some((_date, key)) = rest.split_once('/') else {
            return error(400, "Expected /api/v1/epic/image/{date}/{imageKey}");
        };
        return image_response(state, state.catalog.image(key));
    }
    if let Some(file) = path.strip_prefix("/epic/images/") {
        let key = file.strip_suffix(".png").unwrap_or(file);
        return image_response(state, state.catalog.archive_image(key));
    }

    match path.as_str() {
        "/api/v1/epic/available-dates" => Response::json(&state.catalog.dates()),
        "/api/v1/epic/" | "/api/v1/epic" => match request.get_param("date") {
            Some(date) => Response::json(&state.catalog.records(&date)),
            None => error(400, "Missing date parameter"),
        },
        "/api/health" => Response::text("epic-viewer mock backend"),
        _ => error(404, "Not found"),
    }
}

fn image_response(state: &ServerState, bytes: Option<Arc<Vec<u8>>>) -> Response {
    match bytes {
        Some(bytes) => {
            if !state.options.image_latency.is_zero() {
                thread::sleep(state.options.image_latency);
            }
            Response::from_data("image/png", bytes.as_ref().clone())
        }
        None => error(404, "Image not found"),
    }
}

fn error(status: u16, message: &str) -> Response {
    Response::json(&ErrorResponse { error: message.to_string() }).with_status_code(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ServerState {
        let mut catalog = Catalog::demo(1, 2);
        let key = catalog.records("2015-06-13")[1].image.clone();
        catalog.mark_missing(&key);
        ServerState {
            catalog,
            options: ServerOptions::default(),
            requests: AtomicU32::new(0),
        }
    }

    fn get(state: &ServerState, url: &str) -> Response {
        let request = Request::fake_http("GET", url, vec![], vec![]);
        handle_request(&request, state)
    }

    fn header<'a>(resp: &'a Response, name: &str) -> Option<&'a str> {
        resp.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_ref())
    }

    #[test]
    fn test_rate_limit_headers_count_down() {
        let state = state();
        let first = get(&state, "/api/v1/epic/available-dates");
        assert_eq!(first.status_code, 200);
        assert_eq!(header(&first, HEADER_LIMIT), Some("1000"));
        assert_eq!(header(&first, HEADER_REMAINING), Some("999"));

        let second = get(&state, "/api/health");
        assert_eq!(header(&second, HEADER_REMAINING), Some("998"));
    }

    #[test]
    fn test_routes() {
        let state = state();
        let records = state.catalog.records("2015-06-13").to_vec();

        assert_eq!(get(&state, "/api/v1/epic/?date=2015-06-13").status_code, 200);
        assert_eq!(get(&state, "/api/v1/epic/").status_code, 400);

        let ok = format!("/api/v1/epic/image/2015-06-13/{}", records[0].image);
        assert_eq!(get(&state, &ok).status_code, 200);

        let missing = format!("/api/v1/epic/image/2015-06-13/{}", records[1].image);
        assert_eq!(get(&state, &missing).status_code, 404);

        let archive = format!("/epic/images/{}.png", records[1].image);
        assert_eq!(get(&state, &archive).status_code, 200);

        assert_eq!(get(&state, "/nope").status_code, 404);
    }
}
