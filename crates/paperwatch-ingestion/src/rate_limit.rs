//! Per-client request pacing.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Enforces a minimum interval between consecutive [`wait`](Self::wait) calls.
///
/// Each source client owns its own limiter; nothing is shared across
/// sources. The first call never blocks.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    // Held across the sleep so concurrent callers queue up
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Pace to at most `calls_per_second`. Non-positive rates disable pacing.
    pub fn new(calls_per_second: f64) -> Self {
        let interval = if calls_per_second.is_finite() && calls_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / calls_per_second)
        } else {
            Duration::ZERO
        };
        Self::with_interval(interval)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self { interval, last: Mutex::new(None) }
    }

    /// A limiter that never waits, for tests and local endpoints.
    pub fn unlimited() -> Self {
        Self::with_interval(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until at least one interval has passed since the previous call returned.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            sleep_until(prev + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_does_not_block() {
        let limiter = RateLimiter::new(0.33);
        let t0 = Instant::now();
        limiter.wait().await;
        assert_eq!(t0.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_waits_full_interval() {
        let limiter = RateLimiter::new(2.0);
        let t0 = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;
        assert_eq!(t0.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_counts_towards_interval() {
        let limiter = RateLimiter::new(1.0);
        limiter.wait().await;
        tokio::time::sleep(Duration::from_millis(700)).await;
        let t1 = Instant::now();
        limiter.wait().await;
        assert_eq!(t1.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlimited_never_waits() {
        let limiter = RateLimiter::unlimited();
        let t0 = Instant::now();
        for _ in 0..5 {
            limiter.wait().await;
        }
        assert_eq!(t0.elapsed(), Duration::ZERO);
        assert_eq!(RateLimiter::new(0.0).interval(), Duration::ZERO);
    }
}
