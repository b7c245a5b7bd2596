//! Shared outbound rate limiter.
//!
//! Open-Meteo calls (elevation and forecast alike) funnel through a
//! single process-wide gate that enforces a minimum spacing of
//! `60000 / requests_per_minute` ms between call starts. One slot,
//! strictly serialized: a caller that arrives while another is waiting
//! queues behind it on the mutex. There is no burst allowance — this is
//! a leaky bucket of one, not a token bucket.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let requests_per_minute = requests_per_minute.max(1);
        Self {
            interval: Duration::from_millis(60_000 / requests_per_minute as u64),
            last_request: Mutex::new(None),
        }
    }

    /// Minimum spacing between call starts.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next outbound call is allowed to start.
    ///
    /// The mutex is held across the sleep so concurrent callers are
    /// released one interval apart, in arrival order.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
