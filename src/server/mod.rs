//! Embedded EPIC backend for tests and offline demos.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐      HTTP/JSON      ┌──────────────────────┐
//! │  EpicServer thread      │  ◀──────────────────  │  ApiClient (ureq)    │
//! │  (rouille)              │  ──────────────────▶  │  on worker threads   │
//! │  Arc<ServerState>       │   + X-RateLimit-*    │                      │
//! └─────────────────────────┘                     └──────────────────────┘
//! ```
//!
//! - **rouille** - sync HTTP server, one background thread, stoppable
//! - **Catalog** - in-memory dates, records and PNG payloads
//!
//! # Endpoints
//!
//! | Method | Path                                   | Description                 |
//! |--------|----------------------------------------|-----------------------------|
//! | GET    | `/api/v1/epic/available-dates`         | Date list (newest first)    |
//! | GET    | `/api/v1/epic/?date=YYYY-MM-DD`        | Records, `[]` if unknown    |
//! | GET    | `/api/v1/epic/image/{date}/{imageKey}` | PNG, 404 if marked missing  |
//! | GET    | `/epic/images/{imageKey}.png`          | PNG archive (always served) |
//! | GET    | `/api/health`                          | Health check                |

mod api;
mod catalog;

pub use api::{EpicServer, ServerOptions};
pub use catalog::Catalog;
