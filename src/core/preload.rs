//! Progressive image preloading with per-image status tracking
//!
//! **Why**: A date carries ~10-20 full-disc frames of a few MB each. Firing all
//! requests at once stalls the first frame behind the rest; loading them
//! strictly in sequence makes the carousel wait for the slowest one.
//!
//! # Scheduling
//!
//! - Priority tier: first `priority_count` records dispatched immediately,
//!   in parallel, on the worker pool
//! - Tail: remaining records dispatched one at a time, `tail_delay` apart
//! - `request(id)` promotes a queued record (user navigated to it)
//!
//! # Outcomes
//!
//! Every load settles: `Loaded` with decoded pixels, or `Error` with a
//! fallback URL. Both are final for the cycle; a failed image comes back
//! only with a new `begin()`. One bad image never fails the set.
//!
//! A load still running `load_timeout` after a worker picked it up is
//! demoted to `Error`. Time spent queued behind other jobs does not count.
//!
//! # Cancellation
//!
//! Each `begin()` takes a new generation. Queued jobs from an older
//! generation are skipped by the worker pool; completions from an older
//! generation are dropped in `update()`. Status and cache are purged on
//! every `begin()`/`clear()`, so keys are always a subset of the current set.
//!
//! All state is mutated in `update()` on the owner thread; workers only
//! send results through a channel.

use crossbeam_channel::{Receiver, Sender, unbounded};
use indexmap::IndexMap;
use log::{debug, trace, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::metrics::{LoadCounts, PreloadMetrics};
use super::status::{ImageHandle, LoadStatus, LoadedImage};
use super::workers::Workers;
use crate::api::ImageLoader;
use crate::entities::ImageSet;
use crate::error::Result;

/// Preload scheduling policy
#[derive(Debug, Clone)]
pub struct PreloadConfig {
    /// Records requested immediately in parallel
    pub priority_count: usize,
    /// Gap between tail requests
    pub tail_delay: Duration,
    /// Demote a load to `Error` once a worker has run it this long (None = wait forever)
    pub load_timeout: Option<Duration>,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            priority_count: 3,
            tail_delay: Duration::from_millis(100),
            load_timeout: Some(Duration::from_secs(15)),
        }
    }
}

/// Worker -> owner message
struct PreloadEvent {
    generation: u64,
    id: String,
    kind: EventKind,
}

enum EventKind {
    /// A worker picked the job up; the timeout clock starts here
    Started(Instant),
    Finished(Result<LoadedImage>),
}

/// Preload state for the current image set.
pub struct PreloadManager {
    config: PreloadConfig,
    workers: Arc<Workers>,
    loader: Arc<dyn ImageLoader>,
    /// Generation of the current cycle
    generation: u64,
    set: ImageSet,
    status: IndexMap<String, LoadStatus>,
    cache: HashMap<String, ImageHandle>,
    /// Worker start time of each in-flight load
    loading_since: HashMap<String, Instant>,
    /// Indices waiting for throttled dispatch
    tail: VecDeque<usize>,
    next_tail_at: Option<Instant>,
    metrics: PreloadMetrics,
    tx: Sender<PreloadEvent>,
    rx: Receiver<PreloadEvent>,
}

impl PreloadManager {
    pub fn new(config: PreloadConfig, workers: Arc<Workers>, loader: Arc<dyn ImageLoader>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            config,
            workers,
            loader,
            generation: 0,
            set: ImageSet::empty(),
            status: IndexMap::new(),
            cache: HashMap::new(),
            loading_since: HashMap::new(),
            tail: VecDeque::new(),
            next_tail_at: None,
            metrics: PreloadMetrics::default(),
            tx,
            rx,
        }
    }

    pub fn config(&self) -> &PreloadConfig {
        &self.config
    }

    /// Start a new cycle for `set`, invalidating everything in flight.
    /// Returns the cycle's generation.
    pub fn begin(&mut self, set: ImageSet) -> u64 {
        self.begin_at(set, Instant::now())
    }

    pub(crate) fn begin_at(&mut self, set: ImageSet, now: Instant) -> u64 {
        self.reset(set);
        if self.set.is_empty() {
            return self.generation;
        }

        self.metrics = PreloadMetrics::start(now);
        for record in self.set.iter() {
            self.status.insert(record.identifier.clone(), LoadStatus::NotStarted);
        }

        let priority = self.config.priority_count.min(self.set.len());
        for index in 0..priority {
            self.dispatch(index);
        }
        self.tail.extend(priority..self.set.len());
        if !self.tail.is_empty() {
            self.next_tail_at = Some(now + self.config.tail_delay);
        }

        debug!(
            "Preload generation {} for {}: {} images ({} immediate, {} throttled)",
            self.generation,
            self.set.date(),
            self.set.len(),
            priority,
            self.tail.len()
        );
        self.generation
    }

    /// Drop the current set and all its state.
    pub fn clear(&mut self) {
        self.reset(ImageSet::empty());
    }

    fn reset(&mut self, set: ImageSet) {
        self.generation = self.workers.generation().advance();
        self.set = set;
        self.status.clear();
        self.cache.clear();
        self.loading_since.clear();
        self.tail.clear();
        self.next_tail_at = None;
        self.metrics = PreloadMetrics::default();
        // Results already queued belong to older generations
        let dropped = self.rx.try_iter().count();
        if dropped > 0 {
            trace!("Preload reset discarded {} stale results", dropped);
        }
    }

    /// Request one image now.
    ///
    /// A queued record skips the throttled tail. No-op for anything already
    /// dispatched or settled. Returns true if a load was issued.
    pub fn request(&mut self, id: &str) -> bool {
        let Some(index) = self.set.position(id) else {
            return false;
        };
        if self.status(id) != LoadStatus::NotStarted {
            return false;
        }
        self.tail.retain(|&i| i != index);
        self.dispatch(index);
        true
    }

    fn dispatch(&mut self, index: usize) {
        let Some(record) = self.set.get(index).cloned() else {
            return;
        };
        self.status.insert(record.identifier.clone(), LoadStatus::Loading);
        trace!("Dispatch {} (index {}, generation {})", record.identifier, index, self.generation);

        let generation = self.generation;
        let date = self.set.date().to_string();
        let loader = Arc::clone(&self.loader);
        let tx = self.tx.clone();
        self.workers.execute_with_generation(generation, move || {
            // Receiver gone means the manager was dropped; nothing to report to
            let _ = tx.send(PreloadEvent {
                generation,
                id: record.identifier.clone(),
                kind: EventKind::Started(Instant::now()),
            });
            let outcome = loader.load(&record, &date);
            let _ = tx.send(PreloadEvent {
                generation,
                id: record.identifier,
                kind: EventKind::Finished(outcome),
            });
        });
    }

    /// Apply finished loads, expire timeouts, dispatch the next tail record.
    /// Returns true if any status changed.
    pub fn update(&mut self) -> bool {
        self.update_at(Instant::now())
    }

    pub(crate) fn update_at(&mut self, now: Instant) -> bool {
        let mut changed = false;

        while let Ok(event) = self.rx.try_recv() {
            changed |= self.apply(event, now);
        }
        changed |= self.expire(now);
        changed |= self.pump_tail(now);

        if changed && self.is_complete() {
            self.metrics.record_settled(now);
            debug!(
                "Preload generation {} settled: {} loaded, {} errors",
                self.generation,
                self.counts().loaded,
                self.counts().error
            );
        }
        changed
    }

    fn apply(&mut self, event: PreloadEvent, now: Instant) -> bool {
        if event.generation != self.generation {
            trace!("Dropping stale result for {} (generation {})", event.id, event.generation);
            return false;
        }
        // Only Loading -> terminal; late results after a timeout are ignored
        if self.status.get(&event.id) != Some(&LoadStatus::Loading) {
            return false;
        }

        let outcome = match event.kind {
            EventKind::Started(at) => {
                self.loading_since.insert(event.id, at);
                return false;
            }
            EventKind::Finished(outcome) => outcome,
        };

        match outcome {
            Ok(image) => {
                trace!("Loaded {} ({}x{})", event.id, image.width, image.height);
                self.status.insert(event.id.clone(), LoadStatus::Loaded);
                self.loading_since.remove(&event.id);
                self.cache.insert(event.id, ImageHandle::Decoded(Arc::new(image)));
                self.metrics.record_loaded(now);
            }
            Err(e) => {
                warn!("Failed to preload image {}: {}", event.id, e);
                self.mark_error(&event.id);
            }
        }
        true
    }

    fn mark_error(&mut self, id: &str) {
        let Some(record) = self.set.position(id).and_then(|i| self.set.get(i)) else {
            return;
        };
        let fallback = self.loader.fallback_url(record, self.set.date());
        self.status.insert(id.to_string(), LoadStatus::Error);
        self.loading_since.remove(id);
        self.cache.insert(id.to_string(), ImageHandle::Fallback(fallback));
    }

    fn expire(&mut self, now: Instant) -> bool {
        let Some(timeout) = self.config.load_timeout else {
            return false;
        };
        let expired: Vec<String> = self
            .loading_since
            .iter()
            .filter(|(_, since)| now.duration_since(**since) >= timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            warn!("Image {} still loading after {:?}, marking as failed", id, timeout);
            self.mark_error(id);
        }
        !expired.is_empty()
    }

    fn pump_tail(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_tail_at else {
            return false;
        };
        if now < due {
            return false;
        }

        // Skip records already promoted by request()
        while let Some(index) = self.tail.pop_front() {
            let waiting = self
                .set
                .get(index)
                .map(|r| self.status(&r.identifier) == LoadStatus::NotStarted)
                .unwrap_or(false);
            if waiting {
                self.dispatch(index);
                self.next_tail_at = (!self.tail.is_empty()).then(|| now + self.config.tail_delay);
                return true;
            }
        }
        self.next_tail_at = None;
        false
    }

    // === Accessors ===

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn image_set(&self) -> &ImageSet {
        &self.set
    }

    /// Status of an identifier (NotStarted if unknown)
    pub fn status(&self, id: &str) -> LoadStatus {
        self.status.get(id).copied().unwrap_or_default()
    }

    /// Status of the record at `index` in the current set
    pub fn status_at(&self, index: usize) -> LoadStatus {
        self.set
            .get(index)
            .map(|r| self.status(&r.identifier))
            .unwrap_or_default()
    }

    /// All statuses in set order
    pub fn statuses(&self) -> impl Iterator<Item = (&str, LoadStatus)> {
        self.status.iter().map(|(id, s)| (id.as_str(), *s))
    }

    pub fn handle(&self, id: &str) -> Option<&ImageHandle> {
        self.cache.get(id)
    }

    pub fn cached_ids(&self) -> impl Iterator<Item = &str> {
        self.cache.keys().map(String::as_str)
    }

    pub fn counts(&self) -> LoadCounts {
        let mut counts = LoadCounts {
            total: self.set.len(),
            ..LoadCounts::default()
        };
        for status in self.status.values() {
            match status {
                LoadStatus::NotStarted => counts.not_started += 1,
                LoadStatus::Loading => counts.loading += 1,
                LoadStatus::Loaded => counts.loaded += 1,
                LoadStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    /// Settled percentage in [0, 100]; 0 for an empty set
    pub fn progress(&self) -> f32 {
        let counts = self.counts();
        if counts.total == 0 {
            return 0.0;
        }
        (counts.settled() as f32 / counts.total as f32 * 100.0).clamp(0.0, 100.0)
    }

    /// Every record of a non-empty set reached a terminal status
    pub fn is_complete(&self) -> bool {
        !self.set.is_empty() && self.status.values().all(|s| s.is_terminal())
    }

    /// Something still queued or in flight
    pub fn is_busy(&self) -> bool {
        !self.set.is_empty() && !self.is_complete()
    }

    pub fn metrics(&self) -> &PreloadMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::generation::Generation;
    use crate::core::testing::{MockLoader, Plan};
    use crate::entities::image_record::record;
    use std::thread;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn manager(loader: Arc<MockLoader>, config: PreloadConfig) -> PreloadManager {
        let workers = Arc::new(Workers::new(4, Generation::new()));
        PreloadManager::new(config, workers, loader)
    }

    fn set_of(ids: &[&str]) -> ImageSet {
        let records = ids
            .iter()
            .map(|id| record(id, &format!("epic_1b_20150613_{}", id)))
            .collect();
        ImageSet::new("2015-06-13", records)
    }

    /// Pump until settled; returns observed progress values
    fn settle(pm: &mut PreloadManager) -> Vec<f32> {
        let mut seen = vec![pm.progress()];
        let deadline = Instant::now() + Duration::from_secs(3);
        while !pm.is_complete() && Instant::now() < deadline {
            pm.update();
            seen.push(pm.progress());
            thread::sleep(ms(2));
        }
        seen
    }

    #[test]
    fn test_mixed_outcomes_settle() {
        let loader = Arc::new(
            MockLoader::new()
                .plan("a", Plan::Ok(ms(10)))
                .plan("b", Plan::Ok(ms(20)))
                .plan("c", Plan::Fail(ms(5))),
        );
        let mut pm = manager(Arc::clone(&loader), PreloadConfig::default());
        pm.begin(set_of(&["a", "b", "c"]));
        settle(&mut pm);

        assert!(pm.is_complete());
        assert_eq!(pm.status("a"), LoadStatus::Loaded);
        assert_eq!(pm.status("b"), LoadStatus::Loaded);
        assert_eq!(pm.status("c"), LoadStatus::Error);
        assert_eq!(pm.progress(), 100.0);

        let counts = pm.counts();
        assert_eq!(counts.loaded + counts.error, counts.total);
        assert!(pm.handle("a").and_then(|h| h.decoded()).is_some());
        assert_eq!(
            pm.handle("c").and_then(|h| h.fallback_url()),
            Some("http://fallback/epic/images/epic_1b_20150613_c.png")
        );
        assert!(pm.metrics().time_to_first_image().is_some());
        assert!(pm.metrics().time_to_all_images().is_some());
    }

    #[test]
    fn test_progress_monotonic_and_bounded() {
        let mut loader = MockLoader::new();
        for (i, id) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
            let plan = if i % 3 == 2 { Plan::Fail(ms(3)) } else { Plan::Ok(ms(i as u64 * 4)) };
            loader = loader.plan(id, plan);
        }
        let config = PreloadConfig {
            tail_delay: ms(5),
            ..PreloadConfig::default()
        };
        let mut pm = manager(Arc::new(loader), config);
        pm.begin(set_of(&["a", "b", "c", "d", "e", "f"]));
        let seen = settle(&mut pm);

        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", seen);
        assert!(seen.iter().all(|p| *p <= 100.0));
        assert_eq!(*seen.last().unwrap(), 100.0);
    }

    #[test]
    fn test_priority_tier_then_throttled_tail() {
        let loader = Arc::new(MockLoader::new());
        let config = PreloadConfig {
            priority_count: 3,
            tail_delay: ms(100),
            load_timeout: None,
        };
        let mut pm = manager(loader, config);
        let t0 = Instant::now();
        pm.begin_at(set_of(&["a", "b", "c", "d", "e", "f"]), t0);

        for id in ["a", "b", "c"] {
            assert_ne!(pm.status(id), LoadStatus::NotStarted);
        }
        for id in ["d", "e", "f"] {
            assert_eq!(pm.status(id), LoadStatus::NotStarted);
        }

        pm.update_at(t0 + ms(50));
        assert_eq!(pm.status("d"), LoadStatus::NotStarted);

        pm.update_at(t0 + ms(100));
        assert_ne!(pm.status("d"), LoadStatus::NotStarted);
        assert_eq!(pm.status("e"), LoadStatus::NotStarted);

        // One per delay, never a burst
        pm.update_at(t0 + ms(150));
        assert_eq!(pm.status("e"), LoadStatus::NotStarted);
        pm.update_at(t0 + ms(200));
        assert_ne!(pm.status("e"), LoadStatus::NotStarted);
        assert_eq!(pm.status("f"), LoadStatus::NotStarted);
    }

    #[test]
    fn test_replacement_purges_previous_set() {
        let loader = Arc::new(
            MockLoader::new()
                .plan("x", Plan::Ok(ms(60)))
                .plan("y", Plan::Ok(ms(60)))
                .plan("z", Plan::Fail(ms(60))),
        );
        let mut pm = manager(loader, PreloadConfig::default());
        let first = pm.begin(set_of(&["x", "y", "z"]));
        let second = pm.begin(set_of(&["p", "q"]));
        assert!(second > first);

        settle(&mut pm);
        // Let the old loads finish and deliver
        thread::sleep(ms(100));
        pm.update();

        let ids: Vec<&str> = pm.statuses().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["p", "q"]);
        assert!(pm.cached_ids().all(|id| id == "p" || id == "q"));
        assert_eq!(pm.status("x"), LoadStatus::NotStarted);
        assert!(pm.handle("z").is_none());
    }

    #[test]
    fn test_request_is_idempotent_for_loaded() {
        let loader = Arc::new(MockLoader::new());
        let mut pm = manager(Arc::clone(&loader), PreloadConfig::default());
        pm.begin(set_of(&["a"]));
        settle(&mut pm);

        assert_eq!(pm.status("a"), LoadStatus::Loaded);
        assert!(!pm.request("a"));
        assert!(!pm.request("unknown"));
        thread::sleep(ms(20));
        pm.update();
        assert_eq!(loader.call_count("a"), 1);
    }

    #[test]
    fn test_request_promotes_queued_record() {
        let loader = Arc::new(MockLoader::new());
        let config = PreloadConfig {
            priority_count: 1,
            tail_delay: ms(100),
            load_timeout: None,
        };
        let mut pm = manager(loader, config);
        let t0 = Instant::now();
        pm.begin_at(set_of(&["a", "b", "c"]), t0);
        assert_eq!(pm.status("c"), LoadStatus::NotStarted);

        assert!(pm.request("c"));
        assert_ne!(pm.status("c"), LoadStatus::NotStarted);

        // Tail continues with b, then has nothing left
        pm.update_at(t0 + ms(100));
        assert_ne!(pm.status("b"), LoadStatus::NotStarted);
        assert!(pm.next_tail_at.is_none());
    }

    #[test]
    fn test_error_is_final_for_the_cycle() {
        let loader = Arc::new(
            MockLoader::new()
                .plan("a", Plan::Fail(ms(1)))
                .plan("b", Plan::Ok(ms(1))),
        );
        let mut pm = manager(Arc::clone(&loader), PreloadConfig::default());
        pm.begin(set_of(&["a", "b"]));
        settle(&mut pm);
        assert_eq!(pm.status("a"), LoadStatus::Error);
        assert_eq!(pm.progress(), 100.0);
        let settled_after = pm.metrics().time_to_all_images();

        assert!(!pm.request("a"));
        pm.update();
        assert_eq!(pm.status("a"), LoadStatus::Error);
        assert!(pm.is_complete());
        assert_eq!(pm.progress(), 100.0);
        assert!(pm.handle("a").and_then(|h| h.fallback_url()).is_some());
        assert_eq!(pm.metrics().time_to_all_images(), settled_after);

        thread::sleep(ms(20));
        pm.update();
        assert_eq!(loader.call_count("a"), 1);
    }

    #[test]
    fn test_timeout_demotes_to_error() {
        let loader = Arc::new(MockLoader::new().plan("slow", Plan::Ok(ms(300))));
        let config = PreloadConfig {
            load_timeout: Some(ms(30)),
            ..PreloadConfig::default()
        };
        let mut pm = manager(loader, config);
        pm.begin(set_of(&["slow", "fast"]));
        settle(&mut pm);

        assert_eq!(pm.status("slow"), LoadStatus::Error);
        assert_eq!(pm.status("fast"), LoadStatus::Loaded);
        assert!(pm.handle("slow").and_then(|h| h.fallback_url()).is_some());

        // Late success must not resurrect it
        thread::sleep(ms(350));
        pm.update();
        assert_eq!(pm.status("slow"), LoadStatus::Error);
    }

    #[test]
    fn test_timeout_ignores_queue_time() {
        // One worker: "queued" waits behind "slow" and must not expire while waiting
        let loader = Arc::new(
            MockLoader::new()
                .plan("slow", Plan::Ok(ms(250)))
                .plan("queued", Plan::Ok(ms(10))),
        );
        let config = PreloadConfig {
            priority_count: 2,
            load_timeout: Some(ms(100)),
            ..PreloadConfig::default()
        };
        let workers = Arc::new(Workers::new(1, Generation::new()));
        let mut pm = PreloadManager::new(config, workers, loader);
        pm.begin(set_of(&["slow", "queued"]));
        settle(&mut pm);

        assert!(pm.is_complete());
        assert_eq!(pm.status("slow"), LoadStatus::Error);
        assert_eq!(pm.status("queued"), LoadStatus::Loaded);
    }

    #[test]
    fn test_empty_set() {
        let mut pm = manager(Arc::new(MockLoader::new()), PreloadConfig::default());
        pm.begin(ImageSet::empty());
        assert_eq!(pm.progress(), 0.0);
        assert!(!pm.is_complete());
        assert!(!pm.is_busy());
        assert!(!pm.update());
        assert_eq!(pm.counts().total, 0);
    }
}
