//! Circuit breaker policies guarding a flaky backend from sustained load.
//!
//! State machine (closed → open → half-open → closed/open) matches the
//! transition table: closed counts consecutive failures and opens at the
//! threshold; open rejects calls until `recovery_timeout` elapses, then
//! moves to half-open; half-open allows a limited number of probe calls and
//! closes on success or reopens on failure.

mod registry;

pub use registry::CircuitBreakerRegistry;

use std::sync::Mutex;
use std::time::{Duration, Instant};
use toolrt_core::{CircuitBreakerConfig, Result, RuntimeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Per-tool circuit breaker. `allow_request` is consulted before dispatch;
/// `on_success`/`on_failure` report the outcome once the call completes.
pub trait CircuitBreaker: Send + Sync {
    fn allow_request(&self) -> Result<()>;
    fn on_success(&self);
    fn on_failure(&self);
    fn state(&self) -> CircuitState;
    fn reset(&self);
}

struct StandardInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    half_open_calls: u32,
}

/// Fixed-threshold breaker: opens after `failure_threshold` consecutive
/// failures, probes again after `recovery_timeout`.
pub struct StandardCircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<StandardInner>,
}

impl StandardCircuitBreaker {
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(StandardInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                half_open_calls: 0,
            }),
        }
    }

    fn maybe_transition_to_half_open(&self, inner: &mut StandardInner) {
        if inner.state == CircuitState::Open {
            if let Some(opened_at) = inner.opened_at {
                if opened_at.elapsed() >= self.config.recovery_timeout() {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_calls = 0;
                }
            }
        }
    }
}

impl CircuitBreaker for StandardCircuitBreaker {
    fn allow_request(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        self.maybe_transition_to_half_open(&mut inner);
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => {
                if inner.half_open_calls < self.config.half_open_max_calls {
                    inner.half_open_calls += 1;
                    Ok(())
                } else {
                    Err(RuntimeError::Unavailable {
                        detail: "circuit half-open probe budget exhausted".into(),
                    })
                }
            }
            CircuitState::Open => Err(RuntimeError::Unavailable {
                detail: "circuit is open".into(),
            }),
        }
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.consecutive_failures = 0;
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
        inner.half_open_calls = 0;
    }

    fn on_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::Open => {}
        }
    }

    fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.half_open_calls = 0;
    }
}

struct AdaptiveInner {
    standard: StandardInner,
    threshold: u32,
    window: Vec<bool>,
}

/// Widens or narrows its own `failure_threshold` based on the error rate
/// over a sliding window of the last 20 calls: a quiet backend (error rate
/// below half the threshold) earns a higher threshold, capped at twice the
/// configured value; a noisy one shrinks back down, floored at 1.
pub struct AdaptiveCircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<AdaptiveInner>,
}

const ADAPTIVE_WINDOW_SIZE: usize = 20;

impl AdaptiveCircuitBreaker {
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let threshold = config.failure_threshold;
        Self {
            config,
            inner: Mutex::new(AdaptiveInner {
                standard: StandardInner {
                    state: CircuitState::Closed,
                    consecutive_failures: 0,
                    opened_at: None,
                    half_open_calls: 0,
                },
                threshold,
                window: Vec::with_capacity(ADAPTIVE_WINDOW_SIZE),
            }),
        }
    }

    fn record(&self, inner: &mut AdaptiveInner, failed: bool) {
        inner.window.push(failed);
        if inner.window.len() > ADAPTIVE_WINDOW_SIZE {
            inner.window.remove(0);
        }
        let failures = inner.window.iter().filter(|f| **f).count();
        let error_rate = failures as f64 / inner.window.len() as f64;
        let base = self.config.failure_threshold;
        if error_rate < (base as f64 / 2.0) / ADAPTIVE_WINDOW_SIZE as f64 {
            inner.threshold = (inner.threshold + 1).min(base * 2);
        } else if error_rate > base as f64 / ADAPTIVE_WINDOW_SIZE as f64 {
            inner.threshold = inner.threshold.saturating_sub(1).max(1);
        }
    }
}

impl CircuitBreaker for AdaptiveCircuitBreaker {
    fn allow_request(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.standard.state == CircuitState::Open {
            if let Some(opened_at) = inner.standard.opened_at {
                if opened_at.elapsed() >= self.config.recovery_timeout() {
                    inner.standard.state = CircuitState::HalfOpen;
                    inner.standard.half_open_calls = 0;
                }
            }
        }
        match inner.standard.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => {
                if inner.standard.half_open_calls < self.config.half_open_max_calls {
                    inner.standard.half_open_calls += 1;
                    Ok(())
                } else {
                    Err(RuntimeError::Unavailable {
                        detail: "circuit half-open probe budget exhausted".into(),
                    })
                }
            }
            CircuitState::Open => Err(RuntimeError::Unavailable {
                detail: "circuit is open".into(),
            }),
        }
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.record(&mut inner, false);
        inner.standard.consecutive_failures = 0;
        inner.standard.state = CircuitState::Closed;
        inner.standard.opened_at = None;
        inner.standard.half_open_calls = 0;
    }

    fn on_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.record(&mut inner, true);
        match inner.standard.state {
            CircuitState::HalfOpen => {
                inner.standard.state = CircuitState::Open;
                inner.standard.opened_at = Some(Instant::now());
            }
            CircuitState::Closed => {
                inner.standard.consecutive_failures += 1;
                if inner.standard.consecutive_failures >= inner.threshold {
                    inner.standard.state = CircuitState::Open;
                    inner.standard.opened_at = Some(Instant::now());
                }
            }
            CircuitState::Open => {}
        }
    }

    fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().standard.state
    }

    fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.standard.state = CircuitState::Closed;
        inner.standard.consecutive_failures = 0;
        inner.standard.opened_at = None;
        inner.standard.half_open_calls = 0;
        inner.threshold = self.config.failure_threshold;
        inner.window.clear();
    }
}

/// Always allows requests through. Used for tools that should never be
/// tripped (e.g. purely local, in-process function tools).
#[derive(Debug, Default)]
pub struct NoopCircuitBreaker;

impl CircuitBreaker for NoopCircuitBreaker {
    fn allow_request(&self) -> Result<()> {
        Ok(())
    }

    fn on_success(&self) {}
    fn on_failure(&self) {}

    fn state(&self) -> CircuitState {
        CircuitState::Closed
    }

    fn reset(&self) {}
}

/// Construct a [`CircuitBreaker`] from a tool's declared config.
#[must_use]
pub fn circuit_breaker_for(strategy: &str, config: CircuitBreakerConfig) -> Box<dyn CircuitBreaker> {
    match strategy {
        "noop" => Box::new(NoopCircuitBreaker),
        "adaptive" => Box::new(AdaptiveCircuitBreaker::new(config)),
        _ => Box::new(StandardCircuitBreaker::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: threshold,
            recovery_timeout_ms: 20,
            half_open_max_calls: 1,
            adaptive: false,
        }
    }

    #[test]
    fn test_closed_circuit_allows_requests() {
        let breaker = StandardCircuitBreaker::new(config(3));
        assert!(breaker.allow_request().is_ok());
    }

    #[test]
    fn test_circuit_opens_after_threshold_failures() {
        let breaker = StandardCircuitBreaker::new(config(2));
        breaker.on_failure();
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.allow_request().is_err());
    }

    #[test]
    fn test_success_resets_consecutive_failures() {
        let breaker = StandardCircuitBreaker::new(config(2));
        breaker.on_failure();
        breaker.on_success();
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_transition_after_recovery_timeout() {
        let breaker = StandardCircuitBreaker::new(config(1));
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        std::thread::sleep(Duration::from_millis(30));
        assert!(breaker.allow_request().is_ok());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_half_open_failure_reopens_circuit() {
        let breaker = StandardCircuitBreaker::new(config(1));
        breaker.on_failure();
        std::thread::sleep(Duration::from_millis(30));
        breaker.allow_request().unwrap();
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_half_open_success_closes_circuit() {
        let breaker = StandardCircuitBreaker::new(config(1));
        breaker.on_failure();
        std::thread::sleep(Duration::from_millis(30));
        breaker.allow_request().unwrap();
        breaker.on_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_noop_breaker_never_opens() {
        let breaker = NoopCircuitBreaker;
        for _ in 0..100 {
            breaker.on_failure();
        }
        assert!(breaker.allow_request().is_ok());
    }

    #[test]
    fn test_reset_clears_open_state() {
        let breaker = StandardCircuitBreaker::new(config(1));
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.allow_request().is_ok());
    }

    #[test]
    fn test_adaptive_breaker_still_opens_on_sustained_failures() {
        let breaker = AdaptiveCircuitBreaker::new(config(2));
        for _ in 0..10 {
            breaker.on_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);
    }
}
