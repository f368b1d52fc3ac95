//! API quota display state (passive, externally supplied).

use serde::{Deserialize, Serialize};

/// Quota above which the badge turns amber (percent used)
pub const LOW_QUOTA_PERCENT: f32 = 80.0;

pub const HEADER_LIMIT: &str = "X-RateLimit-Limit";
pub const HEADER_REMAINING: &str = "X-RateLimit-Remaining";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    pub used: u32,
    pub total: u32,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self { used: 0, total: 2000 }
    }
}

impl RateLimitState {
    /// Build from `X-RateLimit-Limit` / `X-RateLimit-Remaining` header values.
    ///
    /// Returns None when the limit header is absent or unparsable. A missing
    /// remaining header counts as zero remaining.
    pub fn from_headers(limit: Option<&str>, remaining: Option<&str>) -> Option<Self> {
        let total: u32 = limit?.trim().parse().ok()?;
        let remaining: u32 = remaining
            .and_then(|r| r.trim().parse().ok())
            .unwrap_or(0);
        Some(Self {
            used: total.saturating_sub(remaining),
            total,
        })
    }

    /// Count one request against the quota (no headers seen)
    pub fn record_request(&mut self) {
        self.used = self.used.saturating_add(1);
    }

    /// Percent of quota used, 0 when total is unknown
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.used as f32 / self.total as f32 * 100.0).min(100.0)
        }
    }

    pub fn remaining_percent(&self) -> f32 {
        100.0 - self.percentage()
    }

    pub fn is_low(&self) -> bool {
        self.percentage() > LOW_QUOTA_PERCENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_headers() {
        let rl = RateLimitState::from_headers(Some("1000"), Some("940")).unwrap();
        assert_eq!(rl, RateLimitState { used: 60, total: 1000 });
        assert!((rl.percentage() - 6.0).abs() < 1e-4);
        assert!(!rl.is_low());

        assert_eq!(RateLimitState::from_headers(None, Some("5")), None);
        assert_eq!(RateLimitState::from_headers(Some("abc"), None), None);
        assert_eq!(
            RateLimitState::from_headers(Some("10"), None),
            Some(RateLimitState { used: 10, total: 10 })
        );
    }

    #[test]
    fn test_low_quota() {
        let rl = RateLimitState { used: 1700, total: 2000 };
        assert!(rl.is_low());
        assert!((rl.remaining_percent() - 15.0).abs() < 1e-4);

        // Exactly 80% used is not low yet
        assert!(!RateLimitState { used: 1600, total: 2000 }.is_low());
        assert!(RateLimitState { used: 1601, total: 2000 }.is_low());
    }

    #[test]
    fn test_zero_total() {
        let mut rl = RateLimitState { used: 0, total: 0 };
        rl.record_request();
        assert_eq!(rl.used, 1);
        assert_eq!(rl.percentage(), 0.0);
    }
}
