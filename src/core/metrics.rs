//! Preload timing and counters for the performance monitor.

use std::time::{Duration, Instant};

/// Per-cycle timings, reset with every image set
#[derive(Debug, Clone, Copy, Default)]
pub struct PreloadMetrics {
    started_at: Option<Instant>,
    first_loaded_at: Option<Instant>,
    settled_at: Option<Instant>,
}

impl PreloadMetrics {
    pub fn start(now: Instant) -> Self {
        Self {
            started_at: Some(now),
            ..Self::default()
        }
    }

    pub fn record_loaded(&mut self, now: Instant) {
        if self.first_loaded_at.is_none() {
            self.first_loaded_at = Some(now);
        }
    }

    pub fn record_settled(&mut self, now: Instant) {
        if self.settled_at.is_none() {
            self.settled_at = Some(now);
        }
    }

    /// Time from cycle start to the first successfully loaded image
    pub fn time_to_first_image(&self) -> Option<Duration> {
        Some(self.first_loaded_at?.duration_since(self.started_at?))
    }

    /// Time from cycle start until every image reached a terminal state
    pub fn time_to_all_images(&self) -> Option<Duration> {
        Some(self.settled_at?.duration_since(self.started_at?))
    }
}

/// Status histogram of the current image set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadCounts {
    pub total: usize,
    pub not_started: usize,
    pub loading: usize,
    pub loaded: usize,
    pub error: usize,
}

impl LoadCounts {
    pub fn settled(&self) -> usize {
        self.loaded + self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_values_stick() {
        let t0 = Instant::now();
        let mut m = PreloadMetrics::start(t0);
        assert!(m.time_to_first_image().is_none());

        m.record_loaded(t0 + Duration::from_millis(10));
        m.record_loaded(t0 + Duration::from_millis(50));
        m.record_settled(t0 + Duration::from_millis(80));
        m.record_settled(t0 + Duration::from_millis(90));

        assert_eq!(m.time_to_first_image(), Some(Duration::from_millis(10)));
        assert_eq!(m.time_to_all_images(), Some(Duration::from_millis(80)));
    }

    #[test]
    fn test_not_started() {
        let m = PreloadMetrics::default();
        assert!(m.time_to_all_images().is_none());
        assert_eq!(LoadCounts { loaded: 2, error: 1, ..Default::default() }.settled(), 3);
    }
}
