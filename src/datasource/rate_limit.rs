//! Weight-based token bucket gating every upstream call.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Default bucket capacity in weight units.
pub const DEFAULT_MAX_WEIGHT: u32 = 1200;
/// Default refill window.
pub const DEFAULT_WINDOW_MS: u64 = 60_000;

/// Upper bound on a single waiter's sleep, so cancellation and refill are
/// observed promptly.
const MAX_POLL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket over a rolling window, refilled lazily by elapsed-time
/// arithmetic.
///
/// `acquire(weight)` blocks until `weight` tokens are present and never
/// partially consumes. Waiters poll with a bounded sleep; dropping the
/// future aborts the wait without consuming tokens. The limiter itself
/// never fails.
#[derive(Debug)]
pub struct RateLimiter {
    max_weight: u32,
    refill_per_token: Duration,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(max_weight: u32, window: Duration) -> Self {
        let max_weight = max_weight.max(1);
        Self {
            max_weight,
            refill_per_token: window / max_weight,
            bucket: Mutex::new(Bucket {
                tokens: max_weight as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            DEFAULT_MAX_WEIGHT,
            Duration::from_millis(DEFAULT_WINDOW_MS),
        )
    }

    /// Block until `weight` tokens are available, then consume them.
    pub async fn acquire(&self, weight: u32) {
        // A weight above capacity could never be satisfied.
        let weight = weight.min(self.max_weight) as f64;

        loop {
            let wait = {
                let mut bucket = self.bucket.lock().unwrap();
                self.refill(&mut bucket);

                if bucket.tokens >= weight {
                    bucket.tokens -= weight;
                    return;
                }

                let deficit = weight - bucket.tokens;
                self.refill_per_token.mul_f64(deficit).min(MAX_POLL)
            };

            tokio::time::sleep(wait).await;
        }
    }

    /// Tokens currently available (after a lazy refill). Test hook.
    pub fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().unwrap();
        self.refill(&mut bucket);
        bucket.tokens
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill);
        let gained = elapsed.as_secs_f64() / self.refill_per_token.as_secs_f64();
        if gained > 0.0 {
            bucket.tokens = (bucket.tokens + gained).min(self.max_weight as f64);
            bucket.last_refill = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_capacity_does_not_block() {
        let limiter = RateLimiter::new(10, Duration::from_secs(10));

        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire(1).await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_beyond_capacity_blocks_for_refill() {
        let limiter = RateLimiter::new(10, Duration::from_secs(10));

        for _ in 0..10 {
            limiter.acquire(1).await;
        }

        // Bucket empty: the 11th acquire must wait one per-token period (1s).
        let start = Instant::now();
        limiter.acquire(1).await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_weighted_acquire_consumes_weight() {
        let limiter = RateLimiter::new(100, Duration::from_secs(100));
        limiter.acquire(30).await;
        assert_eq!(limiter.available() as u32, 70);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_never_partially_consumes() {
        let limiter = RateLimiter::new(10, Duration::from_secs(10));
        limiter.acquire(8).await;

        // Only 2 tokens left; a weight-5 acquire must wait for 3 more and
        // leave the bucket empty once it returns.
        let start = Instant::now();
        limiter.acquire(5).await;
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(limiter.available() < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_does_not_consume() {
        let limiter = std::sync::Arc::new(RateLimiter::new(4, Duration::from_secs(4)));
        limiter.acquire(4).await;

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire(2).await })
        };
        tokio::task::yield_now().await;
        waiter.abort();
        let _ = waiter.await;

        // The aborted waiter must not have taken tokens; after a full window
        // the bucket is back at capacity.
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(limiter.available() as u32, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_caps_at_capacity() {
        let limiter = RateLimiter::new(10, Duration::from_secs(10));
        limiter.acquire(5).await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(limiter.available() as u32, 10);
    }
}
