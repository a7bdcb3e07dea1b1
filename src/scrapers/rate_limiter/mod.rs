//! Adaptive rate limiter.
//!
//! Tracks one inter-request delay for the run. Backs off on failure
//! signals, gradually recovers after a streak of successes. The delay
//! never leaves `[min_delay, max_delay]`.

mod config;

use std::time::Duration;

use tracing::{debug, info, warn};

pub use config::RateLimitConfig;

/// The first backoff step is at least `max_delay / BACKOFF_STEPS`, so a
/// zero minimum still backs off.
const BACKOFF_STEPS: u32 = 16;

/// Adaptive delay owned by the single crawl actor.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    current_delay: Duration,
    consecutive_successes: u32,
    in_backoff: bool,
    failures: u64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let current_delay = config.min_delay();
        Self {
            config,
            current_delay,
            consecutive_successes: 0,
            in_backoff: false,
            failures: 0,
        }
    }

    /// Delay to sleep after the current unit of work.
    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    /// Delay to sleep between categories.
    pub fn category_delay(&self) -> Duration {
        scale(self.current_delay, self.config.category_delay_multiplier)
            .unwrap_or(self.current_delay)
    }

    pub fn in_backoff(&self) -> bool {
        self.in_backoff
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Report a successful unit of work - may decrease delay.
    pub fn record_success(&mut self) {
        self.consecutive_successes += 1;

        if self.in_backoff && self.consecutive_successes >= self.config.recovery_threshold.max(1) {
            let reduced = scale(self.current_delay, self.config.recovery_multiplier)
                .unwrap_or(self.config.min_delay());
            self.current_delay = if reduced <= self.backoff_floor() {
                self.config.min_delay()
            } else {
                self.clamp(reduced)
            };

            if self.current_delay <= self.config.min_delay() {
                self.in_backoff = false;
                info!("Recovered from backoff, delay back to {:?}", self.current_delay);
            } else {
                debug!("Delay reduced to {:?}", self.current_delay);
            }

            self.consecutive_successes = 0;
        }
    }

    /// Report a failure signal (timeout, 429/5xx, dropped connection) -
    /// increases delay.
    pub fn record_failure(&mut self) {
        self.failures += 1;
        self.consecutive_successes = 0;
        self.in_backoff = true;

        let increased = scale(self.current_delay, self.config.backoff_multiplier)
            .unwrap_or(self.config.max_delay())
            .max(self.backoff_floor());
        self.current_delay = self.clamp(increased);

        warn!("Backing off, delay now {:?}", self.current_delay);
    }

    /// Sleep for the current delay.
    pub async fn pause(&self) {
        sleep_if_needed(self.current_delay).await;
    }

    /// Sleep for the between-categories delay.
    pub async fn pause_between_categories(&self) {
        sleep_if_needed(self.category_delay()).await;
    }

    fn backoff_floor(&self) -> Duration {
        (self.config.max_delay() / BACKOFF_STEPS).max(self.config.min_delay())
    }

    fn clamp(&self, delay: Duration) -> Duration {
        delay.clamp(self.config.min_delay(), self.config.max_delay().max(self.config.min_delay()))
    }
}

fn scale(delay: Duration, factor: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).ok()
}

async fn sleep_if_needed(delay: Duration) {
    if delay > Duration::ZERO {
        debug!("Pacing: waiting {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limiter(min_ms: u64, max_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            min_delay_ms: min_ms,
            max_delay_ms: max_ms,
            ..RateLimitConfig::default()
        })
    }

    #[test]
    fn test_starts_at_min_delay() {
        let limiter = limiter(3_000, 15_000);
        assert_eq!(limiter.current_delay(), Duration::from_secs(3));
        assert!(!limiter.in_backoff());
    }

    #[test]
    fn test_backoff_on_failure() {
        let mut limiter = limiter(3_000, 15_000);
        limiter.record_failure();
        assert_eq!(limiter.current_delay(), Duration::from_secs(6));
        assert!(limiter.in_backoff());
    }

    #[test]
    fn test_backoff_clamped_to_max() {
        let mut limiter = limiter(3_000, 15_000);
        for _ in 0..10 {
            limiter.record_failure();
        }
        assert_eq!(limiter.current_delay(), Duration::from_secs(15));
    }

    #[test]
    fn test_recovery_after_threshold() {
        let mut limiter = limiter(1_000, 10_000);
        limiter.record_failure();
        limiter.record_failure();
        assert_eq!(limiter.current_delay(), Duration::from_secs(4));

        limiter.record_success();
        limiter.record_success();
        assert_eq!(limiter.current_delay(), Duration::from_secs(4));

        limiter.record_success();
        assert!(limiter.current_delay() < Duration::from_secs(4));
    }

    #[test]
    fn test_recovers_fully_to_min() {
        let mut limiter = limiter(1_000, 10_000);
        limiter.record_failure();
        for _ in 0..100 {
            limiter.record_success();
        }
        assert_eq!(limiter.current_delay(), Duration::from_secs(1));
        assert!(!limiter.in_backoff());
    }

    #[test]
    fn test_category_delay_is_double() {
        let limiter = limiter(3_000, 15_000);
        assert_eq!(limiter.category_delay(), Duration::from_secs(6));
    }

    #[test]
    fn test_zero_min_delay_stays_zero_without_max() {
        let mut limiter = RateLimiter::new(RateLimitConfig::disabled());
        limiter.record_failure();
        assert_eq!(limiter.current_delay(), Duration::ZERO);
    }

    #[test]
    fn test_zero_min_delay_still_backs_off() {
        let mut limiter = limiter(0, 10_000);
        limiter.record_failure();
        let first = limiter.current_delay();
        assert!(first > Duration::ZERO);

        for _ in 0..4 {
            limiter.record_failure();
        }
        assert!(limiter.current_delay() > first);
        assert!(limiter.current_delay() <= Duration::from_secs(10));

        for _ in 0..200 {
            limiter.record_success();
        }
        assert_eq!(limiter.current_delay(), Duration::ZERO);
        assert!(!limiter.in_backoff());
    }

    proptest! {
        #[test]
        fn delay_stays_within_bounds(
            min_ms in 0u64..5_000,
            span_ms in 0u64..60_000,
            backoff in 0.0f64..8.0,
            recovery in 0.0f64..1.5,
            threshold in 0u32..6,
            events in proptest::collection::vec(any::<bool>(), 0..200),
        ) {
            let config = RateLimitConfig {
                min_delay_ms: min_ms,
                max_delay_ms: min_ms + span_ms,
                backoff_multiplier: backoff,
                recovery_multiplier: recovery,
                recovery_threshold: threshold,
                ..RateLimitConfig::default()
            };
            let (min, max) = (config.min_delay(), config.max_delay());
            let mut limiter = RateLimiter::new(config);

            for failed in events {
                if failed {
                    limiter.record_failure();
                } else {
                    limiter.record_success();
                }
                prop_assert!(limiter.current_delay() >= min);
                prop_assert!(limiter.current_delay() <= max);
            }
        }
    }
}
