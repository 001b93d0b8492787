//! Log throttling utility
//!
//! Limits how often the same log message is recorded. The signaling
//! channel drops outbound messages while the socket is not open, and the
//! capture loop can fail on every frame when a camera misbehaves - both
//! would flood the log without a throttle.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Log throttler that limits how often the same message is logged
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use vigil::utils::LogThrottler;
///
/// let throttler = LogThrottler::new(Duration::from_secs(5));
///
/// // First call returns true
/// assert!(throttler.should_log("send_dropped"));
///
/// // Subsequent calls within 5 seconds return false
/// assert!(!throttler.should_log("send_dropped"));
/// ```
pub struct LogThrottler {
    /// Map of message key to last log time
    last_logged: RwLock<HashMap<String, Instant>>,
    /// Throttle interval
    interval: Duration,
}

impl LogThrottler {
    /// Create a new log throttler with the specified interval
    pub fn new(interval: Duration) -> Self {
        Self {
            last_logged: RwLock::new(HashMap::new()),
            interval,
        }
    }

    /// Create a new log throttler with interval specified in seconds
    pub fn with_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Check if a message should be logged (not throttled)
    ///
    /// Returns `true` if the message should be logged, `false` if it should
    /// be suppressed. If `true` is returned, the internal timestamp is
    /// updated.
    pub fn should_log(&self, key: &str) -> bool {
        let now = Instant::now();

        // First check with read lock (fast path)
        {
            let map = self.last_logged.read().unwrap();
            if let Some(last) = map.get(key) {
                if now.duration_since(*last) < self.interval {
                    return false;
                }
            }
        }

        // Update with write lock
        let mut map = self.last_logged.write().unwrap();
        // Double-check after acquiring write lock
        if let Some(last) = map.get(key) {
            if now.duration_since(*last) < self.interval {
                return false;
            }
        }
        map.insert(key.to_string(), now);
        true
    }

    /// Clear throttle state for a specific key
    ///
    /// Called when a condition recovers, so the next occurrence is logged
    /// immediately.
    pub fn clear(&self, key: &str) {
        self.last_logged.write().unwrap().remove(key);
    }
}

impl Default for LogThrottler {
    /// Create a default log throttler with 5 second interval
    fn default() -> Self {
        Self::with_secs(5)
    }
}

/// Macro for throttled warning logging
#[macro_export]
macro_rules! warn_throttled {
    ($throttler:expr, $key:expr, $($arg:tt)*) => {
        if $throttler.should_log($key) {
            tracing::warn!($($arg)*);
        }
    };
}

/// Macro for throttled error logging
#[macro_export]
macro_rules! error_throttled {
    ($throttler:expr, $key:expr, $($arg:tt)*) => {
        if $throttler.should_log($key) {
            tracing::error!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_should_log_first_call() {
        let throttler = LogThrottler::with_secs(1);
        assert!(throttler.should_log("test_key"));
    }

    #[test]
    fn test_throttling() {
        let throttler = LogThrottler::new(Duration::from_millis(100));

        // First call should succeed
        assert!(throttler.should_log("test_key"));

        // Immediate second call should be throttled
        assert!(!throttler.should_log("test_key"));

        // Wait for throttle to expire
        thread::sleep(Duration::from_millis(150));

        // Should succeed again
        assert!(throttler.should_log("test_key"));
    }

    #[test]
    fn test_different_keys() {
        let throttler = LogThrottler::with_secs(10);

        assert!(throttler.should_log("key1"));
        assert!(throttler.should_log("key2"));
        assert!(!throttler.should_log("key1"));
        assert!(!throttler.should_log("key2"));
    }

    #[test]
    fn test_clear() {
        let throttler = LogThrottler::with_secs(10);

        assert!(throttler.should_log("test_key"));
        assert!(!throttler.should_log("test_key"));

        throttler.clear("test_key");

        assert!(throttler.should_log("test_key"));
    }
}
