//! Retry policies governing whether and how long to wait between attempts.

use rand::Rng;
use std::time::Duration;
use toolrt_core::{RetryConfig, RuntimeError};

/// Decides whether a failed attempt should be retried and how long to wait
/// before the next one.
pub trait RetryPolicy: Send + Sync {
    fn should_retry(&self, attempt: u32, error: &RuntimeError) -> bool;
    fn delay_for(&self, attempt: u32) -> Duration;
    fn max_attempts(&self) -> u32;
}

/// Never retries. Used for tools whose side effects are unsafe to repeat
/// and whose `RetryConfig` is deliberately absent.
#[derive(Debug, Default)]
pub struct NoneRetryPolicy;

impl RetryPolicy for NoneRetryPolicy {
    fn should_retry(&self, _attempt: u32, _error: &RuntimeError) -> bool {
        false
    }

    fn delay_for(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }

    fn max_attempts(&self) -> u32 {
        1
    }
}

/// Retries up to `max_attempts` with a constant delay between each.
#[derive(Debug, Clone)]
pub struct FixedRetryPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy for FixedRetryPolicy {
    fn should_retry(&self, attempt: u32, error: &RuntimeError) -> bool {
        error.retryable() && attempt < self.max_attempts
    }

    fn delay_for(&self, _attempt: u32) -> Duration {
        self.delay
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// `delay = min(base * multiplier^attempt, max_delay)`, optionally jittered
/// by up to ±25% to avoid synchronized retry storms across callers.
#[derive(Debug, Clone)]
pub struct ExponentialBackoffRetryPolicy {
    pub config: RetryConfig,
}

impl ExponentialBackoffRetryPolicy {
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl RetryPolicy for ExponentialBackoffRetryPolicy {
    fn should_retry(&self, attempt: u32, error: &RuntimeError) -> bool {
        error.retryable() && attempt < self.config.max_attempts
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.config.base_delay_ms as f64;
        let scaled = base * self.config.multiplier.powi(attempt as i32);
        let capped = scaled.min(self.config.max_delay_ms as f64);
        let delay_ms = if self.config.jitter {
            let jitter_factor = rand::thread_rng().gen_range(0.75..=1.25);
            capped * jitter_factor
        } else {
            capped
        };
        Duration::from_millis(delay_ms.max(0.0) as u64)
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }
}

/// Construct a [`RetryPolicy`] by strategy name and tool-level config.
#[must_use]
pub fn retry_policy_for(strategy: &str, config: &RetryConfig) -> Box<dyn RetryPolicy> {
    match strategy {
        "none" => Box::new(NoneRetryPolicy),
        "fixed" => Box::new(FixedRetryPolicy {
            delay: Duration::from_millis(config.base_delay_ms),
            max_attempts: config.max_attempts,
        }),
        _ => Box::new(ExponentialBackoffRetryPolicy::new(config.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout_error() -> RuntimeError {
        RuntimeError::Timeout {
            tool_name: "t".into(),
            elapsed_ms: 1,
            limit_ms: 1,
        }
    }

    fn validation_error() -> RuntimeError {
        RuntimeError::validation("bad input")
    }

    #[test]
    fn test_none_policy_never_retries() {
        let policy = NoneRetryPolicy;
        assert!(!policy.should_retry(0, &timeout_error()));
    }

    #[test]
    fn test_retry_policy_for_selects_declared_strategy() {
        let config = RetryConfig {
            max_attempts: 5,
            ..Default::default()
        };
        assert!(!retry_policy_for("none", &config).should_retry(0, &timeout_error()));
        assert!(retry_policy_for("fixed", &config).should_retry(0, &timeout_error()));
        assert!(retry_policy_for("exponential", &config).should_retry(0, &timeout_error()));
        assert!(retry_policy_for("unknown", &config).should_retry(0, &timeout_error()));
    }

    #[test]
    fn test_non_retryable_error_is_never_retried() {
        let policy = ExponentialBackoffRetryPolicy::new(RetryConfig::default());
        assert!(!policy.should_retry(0, &validation_error()));
    }

    #[test]
    fn test_exponential_backoff_respects_max_attempts() {
        let config = RetryConfig {
            max_attempts: 2,
            ..Default::default()
        };
        let policy = ExponentialBackoffRetryPolicy::new(config);
        assert!(policy.should_retry(1, &timeout_error()));
        assert!(!policy.should_retry(2, &timeout_error()));
    }

    #[test]
    fn test_exponential_backoff_grows_with_attempt() {
        let config = RetryConfig {
            base_delay_ms: 100,
            multiplier: 2.0,
            max_delay_ms: 100_000,
            jitter: false,
            max_attempts: 5,
            ..Default::default()
        };
        let policy = ExponentialBackoffRetryPolicy::new(config);
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn test_exponential_backoff_caps_at_max_delay() {
        let config = RetryConfig {
            base_delay_ms: 1000,
            multiplier: 10.0,
            max_delay_ms: 2000,
            jitter: false,
            max_attempts: 5,
            ..Default::default()
        };
        let policy = ExponentialBackoffRetryPolicy::new(config);
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_fixed_policy_uses_constant_delay() {
        let policy = FixedRetryPolicy {
            delay: Duration::from_millis(50),
            max_attempts: 3,
        };
        assert_eq!(policy.delay_for(0), policy.delay_for(2));
    }
}
