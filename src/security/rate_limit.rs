use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

/// Sliding-window attempt limiter keyed by action name.
///
/// Each key holds the timestamps (epoch ms) of its recent attempts; stale
/// entries are discarded on every check. A rejected attempt records nothing,
/// so hammering a blocked key does not extend the block. The whole
/// read-discard-append sequence runs under one lock per call, so concurrent
/// attempts on the same key cannot exceed the threshold.
#[derive(Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Vec<i64>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the attempt is allowed (and records it), false if the
    /// key has exhausted `max_attempts` within the trailing `window_ms`.
    pub fn check(&self, action: &str, max_attempts: usize, window_ms: i64) -> bool {
        self.check_at(action, max_attempts, window_ms, Utc::now().timestamp_millis())
    }

    pub fn check_at(&self, action: &str, max_attempts: usize, window_ms: i64, now_ms: i64) -> bool {
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets.entry(action.to_string()).or_default();

        bucket.retain(|&ts| ts > now_ms - window_ms);

        if bucket.len() >= max_attempts {
            return false;
        }
        bucket.push(now_ms);
        true
    }

    /// Attempts currently inside the window for a key, for dashboards.
    pub fn usage(&self, action: &str, window_ms: i64) -> usize {
        let now_ms = Utc::now().timestamp_millis();
        let buckets = self.buckets.lock().unwrap();
        buckets
            .get(action)
            .map(|b| b.iter().filter(|&&ts| ts > now_ms - window_ms).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: i64 = 60_000;

    #[test]
    fn test_allows_up_to_max_then_blocks() {
        let limiter = RateLimiter::new();
        for _ in 0..10 {
            assert!(limiter.check_at("guest_booking", 10, WINDOW, 0));
        }
        assert!(!limiter.check_at("guest_booking", 10, WINDOW, 0));
    }

    #[test]
    fn test_window_expiry_frees_the_key() {
        let limiter = RateLimiter::new();
        for _ in 0..10 {
            assert!(limiter.check_at("guest_booking", 10, WINDOW, 0));
        }
        assert!(!limiter.check_at("guest_booking", 10, WINDOW, 0));
        // One millisecond past the window, the t=0 attempts are stale.
        assert!(limiter.check_at("guest_booking", 10, WINDOW, 61_000));
    }

    #[test]
    fn test_rejection_records_nothing() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check_at("login", 3, WINDOW, 0));
        }
        // Blocked attempts must not extend the block past the window.
        for _ in 0..50 {
            assert!(!limiter.check_at("login", 3, WINDOW, 100));
        }
        assert!(limiter.check_at("login", 3, WINDOW, WINDOW + 1));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(limiter.check_at("a", 5, WINDOW, 0));
        }
        assert!(!limiter.check_at("a", 5, WINDOW, 0));
        assert!(limiter.check_at("b", 5, WINDOW, 0));
    }

    #[test]
    fn test_partial_expiry_sliding_window() {
        let limiter = RateLimiter::new();
        assert!(limiter.check_at("k", 2, WINDOW, 0));
        assert!(limiter.check_at("k", 2, WINDOW, 30_000));
        assert!(!limiter.check_at("k", 2, WINDOW, 50_000));
        // t=0 entry has aged out; the t=30s one has not.
        assert!(limiter.check_at("k", 2, WINDOW, 61_000));
        assert!(!limiter.check_at("k", 2, WINDOW, 61_001));
    }
}
