//! Token bucket rate limiter, one per registered provider.
//!
//! Buckets refill at `requests_per_minute × elapsed_minutes`, capped at the
//! burst capacity, and start full. [`RateLimiter::allow`] never waits: a
//! denied caller gets `false` immediately.

use std::sync::{Mutex, MutexGuard};

use log::warn;
use tokio::time::Instant;

use crate::provider::RateLimit;

/// Token bucket state for a single provider.
#[derive(Debug)]
struct TokenBucket {
    /// Current number of available tokens.
    tokens: f64,
    /// Last time the bucket was refilled.
    last_refill: Instant,
    /// Refill rate in tokens per minute. Zero disables refill.
    rate_per_minute: f64,
    /// Maximum bucket capacity.
    capacity: f64,
}

impl TokenBucket {
    fn new(rate_per_minute: f64, capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
            rate_per_minute,
            capacity,
        }
    }

    /// Add tokens for the time elapsed since the last refill.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed_minutes = now.duration_since(self.last_refill).as_secs_f64() / 60.0;
        if self.rate_per_minute > 0.0 {
            let new_tokens = elapsed_minutes * self.rate_per_minute;
            self.tokens = (self.tokens + new_tokens).min(self.capacity);
        }
        self.last_refill = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Non-blocking token bucket limiter for one provider.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// Create a full bucket.
    ///
    /// A negative or non-finite rate is treated as zero.
    pub fn new(requests_per_minute: f64, burst: u32) -> Self {
        let rate = if requests_per_minute.is_finite() && requests_per_minute > 0.0 {
            requests_per_minute
        } else {
            0.0
        };
        Self {
            bucket: Mutex::new(TokenBucket::new(rate, f64::from(burst))),
        }
    }

    pub fn from_limit(limit: &RateLimit) -> Self {
        Self::new(limit.requests_per_minute, limit.burst)
    }

    /// Lock the bucket, recovering from poison.
    ///
    /// A poisoned bucket at worst lets one extra call through or denies one.
    fn lock_bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter bucket mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Take one token if available.
    pub fn allow(&self) -> bool {
        self.lock_bucket().try_acquire()
    }

    /// Tokens currently available, after refilling.
    pub fn remaining_tokens(&self) -> f64 {
        let mut bucket = self.lock_bucket();
        bucket.refill();
        bucket.tokens
    }

    /// Refill the bucket to capacity.
    pub fn reset(&self) {
        let mut bucket = self.lock_bucket();
        bucket.tokens = bucket.capacity;
        bucket.last_refill = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_bucket_starts_full() {
        let limiter = RateLimiter::new(60.0, 3);
        for _ in 0..3 {
            assert!(limiter.allow());
        }
        assert!(!limiter.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_per_minute_refills_after_a_minute() {
        let limiter = RateLimiter::new(1.0, 1);

        assert!(limiter.allow());
        assert!(!limiter.allow());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!limiter.allow());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_rate_never_refills() {
        let limiter = RateLimiter::new(0.0, 2);
        assert!(limiter.allow());
        assert!(limiter.allow());

        tokio::time::advance(Duration::from_secs(3600 * 24)).await;
        assert!(!limiter.allow());
        assert_eq!(limiter.remaining_tokens(), 0.0);
    }

    #[test]
    fn test_invalid_rate_treated_as_zero() {
        let limiter = RateLimiter::new(f64::NAN, 1);
        assert!(limiter.allow());
        assert!(!limiter.allow());

        let limiter = RateLimiter::new(-5.0, 0);
        assert!(!limiter.allow());
    }

    #[test]
    fn test_zero_burst_always_denies() {
        let limiter = RateLimiter::new(600.0, 0);
        assert!(!limiter.allow());
        assert!(!limiter.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_never_exceeds_capacity() {
        let limiter = RateLimiter::new(120.0, 2);
        assert!(limiter.allow());

        tokio::time::advance(Duration::from_secs(600)).await;
        assert!((limiter.remaining_tokens() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_restores_capacity() {
        let limiter = RateLimiter::from_limit(&RateLimit::new(0.0, 2));
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());

        limiter.reset();
        assert!(limiter.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fractional_tokens_accumulate() {
        let limiter = RateLimiter::new(2.0, 1);
        assert!(limiter.allow());

        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(!limiter.allow());
        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(limiter.allow());
    }
}
