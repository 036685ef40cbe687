use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-origin request spacing shared by every strategy in a process.
///
/// Two strategies hitting the same origin, even for different bookmakers,
/// share one limiter; distinct origins never block each other. The first
/// `acquire` for an origin fixes that origin's interval.
#[derive(Clone, Default)]
pub struct OriginThrottle {
    origins: Arc<Mutex<HashMap<String, Arc<DirectRateLimiter>>>>,
}

impl OriginThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the origin's next request slot is available.
    pub async fn acquire(&self, origin: &str, min_interval: Duration) {
        let limiter = self.limiter_for(origin, min_interval);
        limiter.until_ready().await;
    }

    /// Non-blocking variant; true when a slot was claimed.
    pub fn try_acquire(&self, origin: &str, min_interval: Duration) -> bool {
        let limiter = self.limiter_for(origin, min_interval);
        limiter.check().is_ok()
    }

    /// Origins that have been throttled at least once, for diagnostics.
    pub fn tracked_origins(&self) -> Vec<String> {
        let origins = self
            .origins
            .lock()
            .expect("throttle origin map should not be poisoned");
        let mut names: Vec<String> = origins.keys().cloned().collect();
        names.sort();
        names
    }

    fn limiter_for(&self, origin: &str, min_interval: Duration) -> Arc<DirectRateLimiter> {
        let mut origins = self
            .origins
            .lock()
            .expect("throttle origin map should not be poisoned");
        origins
            .entry(origin.to_owned())
            .or_insert_with(|| Arc::new(RateLimiter::direct(quota_for_interval(min_interval))))
            .clone()
    }
}

impl std::fmt::Debug for OriginThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginThrottle")
            .field("origins", &self.tracked_origins())
            .finish()
    }
}

fn quota_for_interval(min_interval: Duration) -> Quota {
    let period = min_interval.max(Duration::from_millis(1));
    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(NonZeroU32::new(1).expect("burst of one is non-zero"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn consecutive_acquires_are_spaced() {
        let throttle = OriginThrottle::new();
        let interval = Duration::from_millis(50);

        let started = Instant::now();
        throttle.acquire("https://api.example.test", interval).await;
        throttle.acquire("https://api.example.test", interval).await;

        assert!(
            started.elapsed() >= Duration::from_millis(40),
            "second acquire must wait out the interval"
        );
    }

    #[tokio::test]
    async fn distinct_origins_do_not_block_each_other() {
        let throttle = OriginThrottle::new();
        let interval = Duration::from_secs(60);

        let started = Instant::now();
        throttle.acquire("https://a.example.test", interval).await;
        throttle.acquire("https://b.example.test", interval).await;

        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn try_acquire_claims_then_refuses() {
        let throttle = OriginThrottle::new();
        let interval = Duration::from_secs(60);

        assert!(throttle.try_acquire("https://c.example.test", interval));
        assert!(!throttle.try_acquire("https://c.example.test", interval));
    }

    #[test]
    fn tracked_origins_are_sorted() {
        let throttle = OriginThrottle::new();
        let interval = Duration::from_millis(10);
        throttle.try_acquire("https://b.example.test", interval);
        throttle.try_acquire("https://a.example.test", interval);

        assert_eq!(
            throttle.tracked_origins(),
            vec![
                String::from("https://a.example.test"),
                String::from("https://b.example.test"),
            ]
        );
    }
}
