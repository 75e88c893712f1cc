use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::errors::CoreError;

/// Sliding-window request limiter, one window per caller key.
///
/// Explicitly scoped: created once at process start and injected wherever
/// it is needed — never ambient module state. All bookkeeping sits behind a
/// single mutex; stale windows are pruned lazily on each check.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request for `key`, failing with `RateLimited` when the
    /// key has exhausted its window.
    pub fn check(&self, key: &str) -> Result<(), CoreError> {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());

        // Drop keys whose entire window has expired.
        requests.retain(|_, stamps| {
            stamps.retain(|t| now.duration_since(*t) < self.window);
            !stamps.is_empty()
        });

        let stamps = requests.entry(key.to_string()).or_default();
        if stamps.len() >= self.max_requests {
            return Err(CoreError::RateLimited);
        }
        stamps.push(now);
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        // 100 requests per caller per minute.
        Self::new(100, Duration::from_secs(60))
    }
}
