//! Viewer session: selected date, fetched image set, preload and playback
//!
//! **Why**: The UI needs one owner for everything that changes together when
//! the user picks a date. Session ties the backend, the preloader and the
//! sequencer so that a date switch is one atomic step on the UI thread.
//!
//! # Data Flow
//!
//! ```text
//! select_date() -> bump generation -> worker: backend.image_set(date)
//!                                        |
//! update() <------- SessionEvent --------+
//!    |-> ImageSet -> PreloadManager::begin() -> Sequencer::load()
//!    |-> PreloadManager::update()   (apply image loads, pump tail)
//!    '-> Sequencer::update()        (auto-advance, gated on status)
//! ```
//!
//! Metadata fetches are tagged with a generation; a result for a date the
//! user already left is dropped in `update()`.
//!
//! **Used by**: `app::EpicApp`, tests with mock backends.

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, trace, warn};
use std::sync::Arc;
use std::time::Duration;

use super::metrics::{LoadCounts, PreloadMetrics};
use super::preload::{PreloadConfig, PreloadManager};
use super::sequencer::{DEFAULT_INTERVAL, PlaybackState, Sequencer};
use super::status::{ImageHandle, LoadStatus};
use super::workers::Workers;
use crate::api::{ApiResponse, EpicBackend, ImageLoader};
use crate::entities::date::{normalize_date, parse_date};
use crate::entities::{ImageRecord, ImageSet, RateLimitState};
use crate::error::{EpicError, Result};

/// Date shown before the date list arrives
pub const DEFAULT_DATE: &str = "2024-01-01";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub default_date: String,
    pub preload: PreloadConfig,
    pub playback_interval: Duration,
    /// Start playing as soon as the first image of a set is loaded
    pub autoplay: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_date: DEFAULT_DATE.to_string(),
            preload: PreloadConfig::default(),
            playback_interval: DEFAULT_INTERVAL,
            autoplay: false,
        }
    }
}

/// Worker -> session message
enum SessionEvent {
    Dates(Result<ApiResponse<Vec<String>>>),
    ImageSet {
        generation: u64,
        date: String,
        result: Result<ApiResponse<Vec<ImageRecord>>>,
    },
}

pub struct Session {
    backend: Arc<dyn EpicBackend>,
    workers: Arc<Workers>,
    tx: Sender<SessionEvent>,
    rx: Receiver<SessionEvent>,

    available_dates: Vec<String>,
    dates_loading: bool,
    selected_date: String,
    /// Metadata fetch in flight
    loading: bool,
    /// Generation of the outstanding metadata fetch
    fetch_generation: u64,
    error: Option<EpicError>,
    rate_limit: RateLimitState,

    preload: PreloadManager,
    sequencer: Sequencer,
    autoplay: bool,
    autoplay_pending: bool,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        backend: Arc<dyn EpicBackend>,
        loader: Arc<dyn ImageLoader>,
        workers: Arc<Workers>,
    ) -> Self {
        let (tx, rx) = unbounded();
        let preload = PreloadManager::new(config.preload, Arc::clone(&workers), loader);
        Self {
            backend,
            workers,
            tx,
            rx,
            available_dates: Vec::new(),
            dates_loading: false,
            selected_date: config.default_date,
            loading: false,
            fetch_generation: 0,
            error: None,
            rate_limit: RateLimitState::default(),
            preload,
            sequencer: Sequencer::new(config.playback_interval),
            autoplay: config.autoplay,
            autoplay_pending: false,
        }
    }

    /// Kick off the date list and the initial date.
    pub fn start(&mut self) -> Result<()> {
        self.load_available_dates();
        let date = self.selected_date.clone();
        self.select_date(&date)
    }

    /// Fetch the date list in the background.
    pub fn load_available_dates(&mut self) {
        self.dates_loading = true;
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.workers.execute(move || {
            let _ = tx.send(SessionEvent::Dates(backend.available_dates()));
        });
    }

    /// Switch to `date` (`YYYY-MM-DD`): stop playback, drop the current set
    /// and fetch the new one in the background.
    pub fn select_date(&mut self, date: &str) -> Result<()> {
        parse_date(date)?;

        self.sequencer.on_date_changed();
        self.preload.clear();
        self.selected_date = date.to_string();
        self.error = None;
        self.loading = true;
        self.autoplay_pending = self.autoplay;

        let generation = self.workers.generation().advance();
        self.fetch_generation = generation;
        info!("Loading images for {} (generation {})", date, generation);

        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let date = date.to_string();
        self.workers.execute_with_generation(generation, move || {
            let result = backend.image_set(&date);
            let _ = tx.send(SessionEvent::ImageSet { generation, date, result });
        });
        Ok(())
    }

    /// Re-fetch the selected date ("Try Again").
    pub fn retry(&mut self) -> Result<()> {
        let date = self.selected_date.clone();
        self.select_date(&date)
    }

    /// Apply background results, pump preloading and playback.
    /// Returns true if anything visible changed.
    pub fn update(&mut self) -> bool {
        let mut changed = false;

        while let Ok(event) = self.rx.try_recv() {
            changed |= match event {
                SessionEvent::Dates(result) => self.apply_dates(result),
                SessionEvent::ImageSet { generation, date, result } => {
                    self.apply_image_set(generation, date, result)
                }
            };
        }

        changed |= self.preload.update();

        if self.autoplay_pending && self.current_status() == LoadStatus::Loaded {
            self.autoplay_pending = false;
            changed |= self.sequencer.play(LoadStatus::Loaded);
        }

        let preload = &self.preload;
        if let Some(index) = self.sequencer.update(|i| preload.status_at(i)) {
            trace!("Auto-advanced to image {}", index);
            changed = true;
        }
        changed
    }

    fn apply_dates(&mut self, result: Result<ApiResponse<Vec<String>>>) -> bool {
        self.dates_loading = false;
        match result {
            Ok(response) => {
                let mut dates = Vec::with_capacity(response.data.len());
                for raw in &response.data {
                    match normalize_date(raw) {
                        Some(date) => dates.push(date),
                        None => warn!("Skipping unparsable date '{}'", raw),
                    }
                }
                debug!("Available dates: {}", dates.len());
                self.available_dates = dates;
                if let Some(rate_limit) = response.rate_limit {
                    self.rate_limit = rate_limit;
                }
            }
            Err(e) => {
                warn!("Failed to fetch available dates: {}", e);
                self.available_dates.clear();
            }
        }
        true
    }

    fn apply_image_set(
        &mut self,
        generation: u64,
        date: String,
        result: Result<ApiResponse<Vec<ImageRecord>>>,
    ) -> bool {
        if generation != self.fetch_generation {
            debug!("Dropping stale image set for {} (generation {})", date, generation);
            return false;
        }
        self.loading = false;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch images for {}: {}", date, e);
                self.record_request(None);
                self.error = Some(e);
                return true;
            }
        };
        self.record_request(response.rate_limit);

        if response.data.is_empty() {
            warn!("No images for {}", date);
            self.error = Some(EpicError::EmptyResult { date });
            return true;
        }

        for record in response.data.iter().filter(|r| !r.belongs_to(&date)) {
            warn!("Image {} does not look like it belongs to {}", record.image, date);
        }

        let set = ImageSet::new(date, response.data);
        info!("Fetched {} images for {}", set.len(), set.date());
        self.sequencer.load(set.len());
        self.preload.begin(set);
        true
    }

    /// Quota from headers when present, otherwise count the request locally.
    fn record_request(&mut self, from_headers: Option<RateLimitState>) {
        match from_headers {
            Some(rate_limit) => self.rate_limit = rate_limit,
            None => self.rate_limit.record_request(),
        }
    }

    // === Playback and navigation ===

    pub fn play(&mut self) -> bool {
        let status = self.current_status();
        self.sequencer.play(status)
    }

    pub fn pause(&mut self) {
        self.autoplay_pending = false;
        self.sequencer.pause();
    }

    /// Pause and go back to the first image
    pub fn stop(&mut self) {
        self.autoplay_pending = false;
        self.sequencer.stop();
    }

    pub fn toggle_play(&mut self) -> bool {
        self.autoplay_pending = false;
        let status = self.current_status();
        self.sequencer.toggle(status)
    }

    pub fn next(&mut self) {
        self.autoplay_pending = false;
        self.sequencer.next();
        self.promote_current();
    }

    pub fn previous(&mut self) {
        self.autoplay_pending = false;
        self.sequencer.previous();
        self.promote_current();
    }

    pub fn select_image(&mut self, index: usize) -> bool {
        self.autoplay_pending = false;
        let selected = self.sequencer.select(index);
        if selected {
            self.promote_current();
        }
        selected
    }

    /// Load the image the user navigated to without waiting for the tail.
    fn promote_current(&mut self) {
        if self.current_status() != LoadStatus::NotStarted {
            return;
        }
        if let Some(id) = self.current_record().map(|r| r.identifier.clone()) {
            self.preload.request(&id);
        }
    }

    // === Accessors ===

    pub fn available_dates(&self) -> &[String] {
        &self.available_dates
    }

    pub fn is_dates_loading(&self) -> bool {
        self.dates_loading
    }

    pub fn selected_date(&self) -> &str {
        &self.selected_date
    }

    /// Metadata fetch in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Metadata or images still loading
    pub fn is_busy(&self) -> bool {
        self.loading || self.preload.is_busy()
    }

    pub fn error(&self) -> Option<&EpicError> {
        self.error.as_ref()
    }

    pub fn rate_limit(&self) -> RateLimitState {
        self.rate_limit
    }

    pub fn image_set(&self) -> &ImageSet {
        self.preload.image_set()
    }

    pub fn preload(&self) -> &PreloadManager {
        &self.preload
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.sequencer.state()
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    pub fn current_index(&self) -> usize {
        self.sequencer.current_index()
    }

    pub fn current_record(&self) -> Option<&ImageRecord> {
        self.image_set().get(self.current_index())
    }

    pub fn current_status(&self) -> LoadStatus {
        self.preload.status_at(self.current_index())
    }

    pub fn current_handle(&self) -> Option<&ImageHandle> {
        self.current_record().and_then(|r| self.preload.handle(&r.identifier))
    }

    pub fn progress(&self) -> f32 {
        self.preload.progress()
    }

    pub fn counts(&self) -> LoadCounts {
        self.preload.counts()
    }

    pub fn metrics(&self) -> &PreloadMetrics {
        self.preload.metrics()
    }
}
