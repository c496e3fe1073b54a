//! Token-bucket pacing for Reddit API requests.
//!
//! This bounds the aggregate request rate; the pipeline's randomized
//! inter-mutation delay is layered on top of it.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    /// Script-type OAuth clients get 60 requests per minute.
    pub fn reddit_script() -> Self {
        Self {
            max_requests: 60,
            time_window: Duration::from_secs(60),
            burst_allowance: 5,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = f64::from(config.burst_allowance);
        let refill_rate = f64::from(config.max_requests) / config.time_window.as_secs_f64();
        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_rate,
        }
    }

    /// Blocks until a request slot is available.
    pub async fn acquire(&self) {
        loop {
            let wait = self.try_take().await;
            match wait {
                None => return,
                Some(duration) => {
                    debug!(wait = ?duration, "request budget exhausted, pausing");
                    sleep(duration).await;
                }
            }
        }
    }

    pub async fn available_tokens(&self) -> f64 {
        let mut state = self.state.lock().await;
        Self::refill(&mut state, self.capacity, self.refill_rate);
        state.tokens
    }

    async fn try_take(&self) -> Option<Duration> {
        let mut state = self.state.lock().await;
        Self::refill(&mut state, self.capacity, self.refill_rate);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            None
        } else {
            Some(Duration::from_secs_f64(
                (1.0 - state.tokens) / self.refill_rate,
            ))
        }
    }

    fn refill(state: &mut BucketState, capacity: f64, refill_rate: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * refill_rate).min(capacity);
        state.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bucket_exhausts_after_burst() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 10,
            time_window: Duration::from_secs(10),
            burst_allowance: 3,
        });

        for _ in 0..3 {
            assert!(limiter.try_take().await.is_none());
        }
        assert!(limiter.try_take().await.is_some());
    }

    #[tokio::test]
    async fn bucket_refills_over_time() {
        // 10 tokens per second.
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 10,
            time_window: Duration::from_secs(1),
            burst_allowance: 1,
        });

        assert!(limiter.try_take().await.is_none());
        assert!(limiter.try_take().await.is_some());

        sleep(Duration::from_millis(150)).await;
        assert!(limiter.try_take().await.is_none());
    }

    #[tokio::test]
    async fn acquire_waits_instead_of_failing() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 20,
            time_window: Duration::from_secs(1),
            burst_allowance: 1,
        });

        // Second acquire has to wait for a refill but completes.
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(limiter.available_tokens().await < 1.0);
    }
}
