//! Generation counter for discarding stale async results
//!
//! Every load cycle (date selection, preload of an image set) takes a fresh
//! generation. Jobs and their results carry the generation they were issued
//! for; anything tagged with an older value is silently dropped.
//!
//! **Used by**: Session (metadata fetch), PreloadManager (image loads),
//! Workers (skip stale jobs before they run)

use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared, monotonically increasing generation counter.
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    current: Arc<AtomicU64>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return new value.
    ///
    /// Call this when the image set changes to cancel all pending work.
    pub fn advance(&self) -> u64 {
        let next = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Generation advanced: {}", next);
        next
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let generation = Generation::new();
        assert_eq!(generation.current(), 0);

        assert_eq!(generation.advance(), 1);
        assert_eq!(generation.advance(), 2);
        assert!(generation.is_current(2));
        assert!(!generation.is_current(1));
    }

    #[test]
    fn test_clones_share_counter() {
        let a = Generation::new();
        let b = a.clone();
        let g = a.advance();
        assert!(b.is_current(g));
    }
}
