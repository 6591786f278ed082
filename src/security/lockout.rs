use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;
pub const LOCKOUT_SECS: i64 = 15 * 60;

#[derive(Debug, Default, Clone)]
struct LockoutEntry {
    failures: u32,
    locked_until: Option<i64>,
}

/// Brute-force guard keyed by client context (login identifier). Five
/// consecutive failures lock the key for fifteen minutes; one success clears
/// both the counter and the lock. An expired lock also resets the counter, so
/// the next run of failures starts from zero.
#[derive(Default)]
pub struct LockoutTracker {
    entries: Mutex<HashMap<String, LockoutEntry>>,
}

impl LockoutTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ok if attempts are currently allowed, Err(locked_until) otherwise.
    pub fn check(&self, key: &str) -> Result<(), i64> {
        self.check_at(key, Utc::now().timestamp())
    }

    pub fn check_at(&self, key: &str, now: i64) -> Result<(), i64> {
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get_mut(key) else {
            return Ok(());
        };

        match entry.locked_until {
            Some(until) if until > now => Err(until),
            Some(_) => {
                entries.remove(key);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Records a failed attempt. Returns Some(locked_until) when this failure
    /// tripped the lock.
    pub fn record_failure(&self, key: &str) -> Option<i64> {
        self.record_failure_at(key, Utc::now().timestamp())
    }

    pub fn record_failure_at(&self, key: &str, now: i64) -> Option<i64> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key.to_string()).or_default();

        if entry.locked_until.is_some_and(|until| until <= now) {
            *entry = LockoutEntry::default();
        }

        entry.failures += 1;
        if entry.failures >= MAX_CONSECUTIVE_FAILURES && entry.locked_until.is_none() {
            entry.locked_until = Some(now + LOCKOUT_SECS);
        }
        entry.locked_until
    }

    pub fn record_success(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locks_on_fifth_failure() {
        let tracker = LockoutTracker::new();
        for _ in 0..4 {
            assert!(tracker.record_failure_at("c1", 0).is_none());
            assert!(tracker.check_at("c1", 0).is_ok());
        }
        let until = tracker.record_failure_at("c1", 0);
        assert_eq!(until, Some(LOCKOUT_SECS));
        assert_eq!(tracker.check_at("c1", 1), Err(LOCKOUT_SECS));
    }

    #[test]
    fn test_lock_expires_and_counter_resets() {
        let tracker = LockoutTracker::new();
        for _ in 0..5 {
            tracker.record_failure_at("c1", 0);
        }
        assert!(tracker.check_at("c1", LOCKOUT_SECS - 1).is_err());
        assert!(tracker.check_at("c1", LOCKOUT_SECS).is_ok());
        // Fresh run of failures after expiry, not an instant re-lock.
        assert!(tracker.record_failure_at("c1", LOCKOUT_SECS + 1).is_none());
    }

    #[test]
    fn test_success_clears_counter_and_lock() {
        let tracker = LockoutTracker::new();
        for _ in 0..4 {
            tracker.record_failure_at("c1", 0);
        }
        tracker.record_success("c1");
        assert!(tracker.record_failure_at("c1", 0).is_none());
        assert!(tracker.check_at("c1", 0).is_ok());
    }

    #[test]
    fn test_keys_are_independent() {
        let tracker = LockoutTracker::new();
        for _ in 0..5 {
            tracker.record_failure_at("c1", 0);
        }
        assert!(tracker.check_at("c1", 0).is_err());
        assert!(tracker.check_at("c2", 0).is_ok());
    }
}
