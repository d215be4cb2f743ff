//! Per-tool concurrency gate.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use toolrt_core::{Result, RuntimeError, ToolLimiter};

/// Caps in-flight calls per tool id. A tool with no configured limit in
/// `max_concurrent` falls back to `default_limit`, mirroring the budget
/// tracker's per-key threshold lookup with a fleet-wide default.
pub struct ConcurrencyLimiter {
    default_limit: u32,
    limits: DashMap<String, u32>,
    in_flight: DashMap<String, Arc<AtomicU32>>,
}

impl ConcurrencyLimiter {
    #[must_use]
    pub fn new(default_limit: u32) -> Self {
        Self {
            default_limit,
            limits: DashMap::new(),
            in_flight: DashMap::new(),
        }
    }

    pub fn set_limit(&self, tool_id: &str, limit: u32) {
        self.limits.insert(tool_id.to_string(), limit);
    }

    fn counter(&self, tool_id: &str) -> Arc<AtomicU32> {
        self.in_flight
            .entry(tool_id.to_string())
            .or_insert_with(|| Arc::new(AtomicU32::new(0)))
            .clone()
    }
}

#[async_trait]
impl ToolLimiter for ConcurrencyLimiter {
    async fn acquire(&self, tool_id: &str) -> Result<()> {
        let limit = self
            .limits
            .get(tool_id)
            .map(|l| *l)
            .unwrap_or(self.default_limit);
        let counter = self.counter(tool_id);
        let mut current = counter.load(Ordering::SeqCst);
        loop {
            if current >= limit {
                return Err(RuntimeError::Unavailable {
                    detail: format!("tool {tool_id} is at its concurrency limit of {limit}"),
                });
            }
            match counter.compare_exchange_weak(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(()),
                Err(observed) => current = observed,
            }
        }
    }

    async fn release(&self, tool_id: &str) {
        if let Some(counter) = self.in_flight.get(tool_id) {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_succeeds_under_limit() {
        let limiter = ConcurrencyLimiter::new(2);
        assert!(limiter.acquire("t").await.is_ok());
        assert!(limiter.acquire("t").await.is_ok());
    }

    #[tokio::test]
    async fn test_acquire_fails_over_limit() {
        let limiter = ConcurrencyLimiter::new(1);
        limiter.acquire("t").await.unwrap();
        assert!(limiter.acquire("t").await.is_err());
    }

    #[tokio::test]
    async fn test_release_frees_a_slot() {
        let limiter = ConcurrencyLimiter::new(1);
        limiter.acquire("t").await.unwrap();
        limiter.release("t").await;
        assert!(limiter.acquire("t").await.is_ok());
    }

    #[tokio::test]
    async fn test_per_tool_limit_overrides_default() {
        let limiter = ConcurrencyLimiter::new(1);
        limiter.set_limit("t", 3);
        assert!(limiter.acquire("t").await.is_ok());
        assert!(limiter.acquire("t").await.is_ok());
        assert!(limiter.acquire("t").await.is_ok());
        assert!(limiter.acquire("t").await.is_err());
    }
}
