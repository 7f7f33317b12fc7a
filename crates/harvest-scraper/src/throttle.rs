//! Per-origin politeness throttle.
//!
//! Requests to the same origin are spaced by at least `base + jitter`, where
//! jitter is drawn uniformly from `[0, max_jitter]` for every request. The
//! interval is measured from the later of the previous slot and the moment
//! the previous request to that origin completed, so with one request in
//! flight the wait starts after the page has been processed.
//!
//! Slots are reserved under a short-lived lock; the actual sleep happens
//! outside it, so requests to unrelated origins never wait on each other.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::fetcher::extract_origin;

#[derive(Debug)]
pub struct OriginThrottle {
    base: Duration,
    max_jitter: Duration,
    last_activity: Mutex<HashMap<String, Instant>>,
}

impl OriginThrottle {
    #[must_use]
    pub fn new(base: Duration, max_jitter: Duration) -> Self {
        Self {
            base,
            max_jitter,
            last_activity: Mutex::new(HashMap::new()),
        }
    }

    /// A throttle that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Waits until a request to `url`'s origin is allowed, and returns how
    /// long it waited. The first request to an origin proceeds immediately.
    pub async fn acquire(&self, url: &str) -> Duration {
        let origin = extract_origin(url);
        let now = Instant::now();
        let slot = {
            let mut last_activity = self
                .last_activity
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let slot = match last_activity.get(&origin) {
                Some(last) => (*last + self.base + self.sample_jitter()).max(now),
                None => now,
            };
            last_activity.insert(origin.clone(), slot);
            slot
        };

        let waited = slot.saturating_duration_since(now);
        if !waited.is_zero() {
            tracing::debug!(
                origin = %origin,
                wait_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                "politeness delay"
            );
            tokio::time::sleep_until(slot).await;
        }
        waited
    }

    /// Records that a request to `url`'s origin has finished. The next slot
    /// is measured from now when that is later than the reserved one.
    pub fn complete(&self, url: &str) {
        let origin = extract_origin(url);
        let now = Instant::now();
        let mut last_activity = self
            .last_activity
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = last_activity.entry(origin).or_insert(now);
        if *entry < now {
            *entry = now;
        }
    }

    fn sample_jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}
