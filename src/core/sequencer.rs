//! Timed carousel playback over the current image set
//!
//! **Why**: Auto-advance must never show a frame that is still loading, and
//! must never outlive the date it was started for.
//!
//! The sequencer does NOT own the image set or load statuses. It only knows
//! the set length; callers pass load status in as a closure, the same way
//! the preload manager is the single source of truth for it.
//!
//! # Timing Model
//!
//! Interval-based (default 600 ms). `update()` is called every UI frame;
//! a single optional deadline is kept. The deadline is armed only while the
//! current image is settled and cleared on pause, stop and date change.
//!
//! # Gating
//!
//! - `play()` requires the current image to be `Loaded`
//! - A due tick advances only if the next image is settled; otherwise it
//!   holds and re-checks on the next update
//! - Manual navigation always works and pauses playback

use log::{debug, trace};
use std::fmt;
use std::time::{Duration, Instant};

use super::status::LoadStatus;

/// Default auto-advance interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "Stopped"),
            PlaybackState::Playing => write!(f, "Playing"),
        }
    }
}

/// Playback position and timer
#[derive(Debug, Clone)]
pub struct Sequencer {
    current_index: usize,
    len: usize,
    state: PlaybackState,
    interval: Duration,
    /// Next advance deadline (runtime-only)
    timer: Option<Instant>,
}

impl Sequencer {
    pub fn new(interval: Duration) -> Self {
        Self {
            current_index: 0,
            len: 0,
            state: PlaybackState::Stopped,
            interval,
            timer: None,
        }
    }

    /// Point at a new set of `len` images, starting at 0.
    pub fn load(&mut self, len: usize) {
        self.len = len;
        self.current_index = 0;
        self.timer = None;
    }

    /// Date switched: stop and forget the old set.
    pub fn on_date_changed(&mut self) {
        if self.state == PlaybackState::Playing {
            debug!("Date changed, stopping playback at {}", self.current_index);
        }
        self.stop();
        self.load(0);
    }

    /// Start playback if the current image is ready. Returns whether playing.
    pub fn play(&mut self, current_status: LoadStatus) -> bool {
        if self.len == 0 || current_status != LoadStatus::Loaded {
            trace!("Play refused: current image {} ({})", self.current_index, current_status);
            return false;
        }
        self.state = PlaybackState::Playing;
        self.timer = None;
        debug!("Playback started at {}/{}", self.current_index + 1, self.len);
        true
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            trace!("Playback paused at {}", self.current_index);
        }
        self.state = PlaybackState::Stopped;
        self.timer = None;
    }

    /// Pause and rewind to the first image (Escape)
    pub fn stop(&mut self) {
        self.pause();
        self.current_index = 0;
    }

    /// Play/pause toggle (Space)
    pub fn toggle(&mut self, current_status: LoadStatus) -> bool {
        if self.is_playing() {
            self.pause();
            false
        } else {
            self.play(current_status)
        }
    }

    pub fn next(&mut self) {
        self.pause();
        if self.len > 0 {
            self.current_index = (self.current_index + 1) % self.len;
        }
    }

    pub fn previous(&mut self) {
        self.pause();
        if self.len > 0 {
            self.current_index = (self.current_index + self.len - 1) % self.len;
        }
    }

    /// Jump to `index`; out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.pause();
        self.current_index = index;
        true
    }

    /// Advance playback if due.
    /// Returns Some(new_index) if the index changed, None otherwise.
    pub fn update(&mut self, status: impl Fn(usize) -> LoadStatus) -> Option<usize> {
        self.update_at(Instant::now(), status)
    }

    pub(crate) fn update_at(&mut self, now: Instant, status: impl Fn(usize) -> LoadStatus) -> Option<usize> {
        if !self.is_playing() || self.len <= 1 {
            self.timer = None;
            return None;
        }
        // Current frame still loading (e.g. just navigated to it): wait, disarmed
        if !status(self.current_index).is_terminal() {
            self.timer = None;
            return None;
        }

        let Some(deadline) = self.timer else {
            self.timer = Some(now + self.interval);
            return None;
        };
        if now < deadline {
            return None;
        }

        let next = (self.current_index + 1) % self.len;
        if !status(next).is_terminal() {
            trace!("Holding at {}: image {} not settled", self.current_index, next);
            return None;
        }

        self.current_index = next;
        self.timer = Some(now + self.interval);
        Some(next)
    }

    // === Accessors ===

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Frames per second implied by the interval
    pub fn frame_rate(&self) -> f32 {
        if self.interval.is_zero() {
            return 0.0;
        }
        1.0 / self.interval.as_secs_f32()
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(_: usize) -> LoadStatus {
        LoadStatus::Loaded
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Playing sequencer over `len` loaded images with its timer armed at t0
    fn playing(len: usize, t0: Instant) -> Sequencer {
        let mut seq = Sequencer::default();
        seq.load(len);
        assert!(seq.play(LoadStatus::Loaded));
        assert_eq!(seq.update_at(t0, loaded), None);
        assert!(seq.is_timer_armed());
        seq
    }

    #[test]
    fn test_next_previous_wrap_back_to_start() {
        let mut seq = Sequencer::default();
        seq.load(7);
        seq.select(3);
        for _ in 0..7 {
            seq.next();
        }
        assert_eq!(seq.current_index(), 3);
        for _ in 0..7 {
            seq.previous();
        }
        assert_eq!(seq.current_index(), 3);

        seq.select(0);
        seq.previous();
        assert_eq!(seq.current_index(), 6);
    }

    #[test]
    fn test_navigation_on_empty_set() {
        let mut seq = Sequencer::default();
        seq.next();
        seq.previous();
        assert_eq!(seq.current_index(), 0);
        assert!(!seq.select(0));
        assert!(!seq.play(LoadStatus::Loaded));
    }

    #[test]
    fn test_play_requires_loaded_current() {
        let mut seq = Sequencer::default();
        seq.load(3);
        assert!(!seq.play(LoadStatus::NotStarted));
        assert!(!seq.play(LoadStatus::Loading));
        assert!(!seq.play(LoadStatus::Error));
        assert_eq!(seq.state(), PlaybackState::Stopped);
        assert!(seq.play(LoadStatus::Loaded));
        assert_eq!(seq.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_advances_on_interval() {
        let t0 = Instant::now();
        let mut seq = playing(3, t0);

        assert_eq!(seq.update_at(t0 + ms(599), loaded), None);
        assert_eq!(seq.update_at(t0 + ms(600), loaded), Some(1));
        assert_eq!(seq.update_at(t0 + ms(1200), loaded), Some(2));
        assert_eq!(seq.update_at(t0 + ms(1800), loaded), Some(0));
    }

    #[test]
    fn test_holds_on_unsettled_next() {
        let t0 = Instant::now();
        let mut seq = playing(3, t0);
        let next_loading = |i: usize| if i == 1 { LoadStatus::Loading } else { LoadStatus::Loaded };

        assert_eq!(seq.update_at(t0 + ms(600), next_loading), None);
        assert_eq!(seq.update_at(t0 + ms(900), next_loading), None);
        assert_eq!(seq.current_index(), 0);
        assert!(seq.is_playing());

        // Error counts as settled
        let next_failed = |i: usize| if i == 1 { LoadStatus::Error } else { LoadStatus::Loaded };
        assert_eq!(seq.update_at(t0 + ms(950), next_failed), Some(1));
    }

    #[test]
    fn test_timer_disarmed_while_current_loading() {
        let t0 = Instant::now();
        let mut seq = playing(3, t0);
        assert_eq!(seq.update_at(t0 + ms(700), |_| LoadStatus::Loading), None);
        assert!(!seq.is_timer_armed());
        assert!(seq.is_playing());
    }

    #[test]
    fn test_manual_navigation_pauses() {
        let t0 = Instant::now();
        let mut seq = playing(4, t0);
        seq.next();
        assert!(!seq.is_playing());
        assert!(!seq.is_timer_armed());

        let mut seq = playing(4, t0);
        assert!(seq.select(2));
        assert_eq!(seq.current_index(), 2);
        assert!(!seq.is_playing());
        assert!(!seq.select(9));
        assert_eq!(seq.current_index(), 2);
    }

    #[test]
    fn test_date_change_stops() {
        let t0 = Instant::now();
        let mut seq = playing(4, t0);
        seq.update_at(t0 + ms(600), loaded);
        seq.on_date_changed();
        assert_eq!(seq.state(), PlaybackState::Stopped);
        assert_eq!(seq.current_index(), 0);
        assert!(seq.is_empty());
        assert!(!seq.is_timer_armed());
    }

    #[test]
    fn test_single_image_never_advances() {
        let t0 = Instant::now();
        let mut seq = Sequencer::default();
        seq.load(1);
        assert!(seq.play(LoadStatus::Loaded));
        for step in 0..5 {
            assert_eq!(seq.update_at(t0 + ms(step * 700), loaded), None);
        }
        assert!(!seq.is_timer_armed());
    }

    #[test]
    fn test_toggle() {
        let mut seq = Sequencer::default();
        seq.load(2);
        assert!(seq.toggle(LoadStatus::Loaded));
        assert!(!seq.toggle(LoadStatus::Loaded));
        assert!(!seq.is_playing());
        assert!((Sequencer::default().frame_rate() - 1.0 / 0.6).abs() < 1e-3);
    }

    #[test]
    fn test_stop_rewinds() {
        let mut seq = Sequencer::default();
        seq.load(4);
        seq.next();
        seq.next();
        assert!(seq.play(LoadStatus::Loaded));

        seq.stop();
        assert!(!seq.is_playing());
        assert!(!seq.is_timer_armed());
        assert_eq!(seq.current_index(), 0);
        assert_eq!(seq.len(), 4);
    }
}
