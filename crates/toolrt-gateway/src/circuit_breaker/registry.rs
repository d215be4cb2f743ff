//! Per-tool circuit breaker lifecycle.

use super::{circuit_breaker_for, CircuitBreaker};
use dashmap::DashMap;
use std::sync::Arc;
use toolrt_core::CircuitBreakerConfig;

/// Holds one [`CircuitBreaker`] per tool id, created lazily on first use and
/// reused for every subsequent call so failure counts accumulate across
/// invocations rather than resetting per call.
#[derive(Default)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<dyn CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            breakers: DashMap::new(),
        }
    }

    pub fn get_or_create(
        &self,
        tool_id: &str,
        strategy: &str,
        config: &CircuitBreakerConfig,
    ) -> Arc<dyn CircuitBreaker> {
        if let Some(existing) = self.breakers.get(tool_id) {
            return existing.clone();
        }
        let created: Arc<dyn CircuitBreaker> = Arc::from(circuit_breaker_for(strategy, config.clone()));
        self.breakers
            .entry(tool_id.to_string())
            .or_insert(created)
            .clone()
    }

    pub fn reset(&self, tool_id: &str) {
        if let Some(breaker) = self.breakers.get(tool_id) {
            breaker.reset();
        }
    }

    pub fn reset_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::CircuitState;

    #[test]
    fn test_same_tool_reuses_breaker_instance() {
        let registry = CircuitBreakerRegistry::new();
        let config = CircuitBreakerConfig::default();
        let a = registry.get_or_create("tool-1", "standard", &config);
        a.on_failure();
        let b = registry.get_or_create("tool-1", "standard", &config);
        assert_eq!(b.state(), a.state());
    }

    #[test]
    fn test_different_tools_get_independent_breakers() {
        let registry = CircuitBreakerRegistry::new();
        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        };
        let a = registry.get_or_create("tool-a", "standard", &config);
        a.on_failure();
        let b = registry.get_or_create("tool-b", "standard", &config);
        assert_eq!(a.state(), CircuitState::Open);
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[test]
    fn test_reset_reopens_a_tripped_breaker() {
        let registry = CircuitBreakerRegistry::new();
        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        };
        let breaker = registry.get_or_create("tool-1", "standard", &config);
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        registry.reset("tool-1");
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
