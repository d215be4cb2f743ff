//! The orchestrator: turns `(tool_id, arguments, ToolContext)` into a
//! [`ToolResult`] by composing every pipeline stage in order.
//!
//! `validate → authorize → idempotency lookup → rate limit → trace span →
//! retry(circuit breaker(timeout(execute))) → metrics → idempotency
//! persist → result`

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerRegistry};
use crate::executors::ToolExecutor;
use crate::idempotency::{is_sentinel_value, key_generator_for, sentinel_value};
use crate::registry::ToolRegistry;
use crate::retry::retry_policy_for;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use toolrt_core::{
    Result, RuntimeError, ToolContext, ToolLimiter, ToolMemory, ToolMetrics, ToolResult,
    ToolSecurity, ToolTracer, ToolUsage, ToolValidator,
};

/// How long a caller waits to acquire the per-key idempotency lock before
/// giving up rather than serializing the duplicate indefinitely.
const IDEMPOTENCY_LOCK_TTL: Duration = Duration::from_secs(30);

/// Ties every collaborator together. Constructed once at startup and
/// shared across calls; all interior state (circuit breakers, registry) is
/// safe to mutate concurrently.
pub struct ToolRuntime {
    registry: Arc<ToolRegistry>,
    validator: Arc<dyn ToolValidator>,
    security: Arc<dyn ToolSecurity>,
    memory: Arc<dyn ToolMemory>,
    metrics: Arc<dyn ToolMetrics>,
    tracer: Arc<dyn ToolTracer>,
    limiter: Arc<dyn ToolLimiter>,
    circuit_breakers: Arc<CircuitBreakerRegistry>,
    executors: HashMap<&'static str, Arc<dyn ToolExecutor>>,
}

/// Builds a [`ToolRuntime`] collaborator-by-collaborator. Every field has
/// to be supplied explicitly — there is no builder default for the
/// executors map, since a runtime with no backend wired up can't run
/// anything.
pub struct ToolRuntimeBuilder {
    registry: Arc<ToolRegistry>,
    validator: Arc<dyn ToolValidator>,
    security: Arc<dyn ToolSecurity>,
    memory: Arc<dyn ToolMemory>,
    metrics: Arc<dyn ToolMetrics>,
    tracer: Arc<dyn ToolTracer>,
    limiter: Arc<dyn ToolLimiter>,
    executors: HashMap<&'static str, Arc<dyn ToolExecutor>>,
}

impl ToolRuntimeBuilder {
    #[must_use]
    pub fn new(
        registry: Arc<ToolRegistry>,
        validator: Arc<dyn ToolValidator>,
        security: Arc<dyn ToolSecurity>,
        memory: Arc<dyn ToolMemory>,
        metrics: Arc<dyn ToolMetrics>,
        tracer: Arc<dyn ToolTracer>,
        limiter: Arc<dyn ToolLimiter>,
    ) -> Self {
        Self {
            registry,
            validator,
            security,
            memory,
            metrics,
            tracer,
            limiter,
            executors: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_executor(mut self, backend_type: &'static str, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executors.insert(backend_type, executor);
        self
    }

    #[must_use]
    pub fn build(self) -> ToolRuntime {
        ToolRuntime {
            registry: self.registry,
            validator: self.validator,
            security: self.security,
            memory: self.memory,
            metrics: self.metrics,
            tracer: self.tracer,
            limiter: self.limiter,
            circuit_breakers: Arc::new(CircuitBreakerRegistry::new()),
            executors: self.executors,
        }
    }
}

impl ToolRuntime {
    /// Invokes a tool end to end. Never returns `Err` — every failure mode
    /// (unknown tool, validation, authorization, timeout, exhausted
    /// retries, open circuit) is reported inside the returned
    /// [`ToolResult`] so callers always get usage accounting back.
    pub async fn call(&self, tool_id: &str, arguments: Value, ctx: &ToolContext) -> ToolResult {
        let started = Instant::now();

        let spec = match self.registry.get(tool_id) {
            Ok(spec) => spec,
            Err(err) => return self.fail(err, started),
        };

        if let Err(err) = self.validator.validate(&spec, &arguments).await {
            return self.fail(err, started);
        }

        if let Err(err) = self.security.authorize(&spec, ctx).await {
            return self.fail(err, started);
        }

        if let Err(err) = self.security.check_egress(&spec, &arguments).await {
            return self.fail(err, started);
        }

        let idempotency_key = spec
            .idempotency
            .as_ref()
            .map(|cfg| key_generator_for(cfg).generate(&spec, ctx, &arguments));

        // Held across lookup, execution, and persist so a second concurrent
        // caller with the same key blocks here instead of racing the first
        // caller's get-then-set.
        let _idempotency_lock = match &idempotency_key {
            Some(key) => match self.memory.lock(key, IDEMPOTENCY_LOCK_TTL).await {
                Ok(guard) => Some(guard),
                Err(err) => return self.fail(err, started),
            },
            None => None,
        };

        if let Some(key) = &idempotency_key {
            match self.memory.get(key).await {
                Ok(Some(cached)) => {
                    self.metrics
                        .increment("tool.idempotency.replayed", &[("tool", &spec.id)])
                        .await;
                    let data = if is_sentinel_value(&cached) { Value::Null } else { cached };
                    let usage = ToolUsage {
                        cached_hit: true,
                        idempotency_reused: true,
                        ..ToolUsage::default()
                    };
                    return ToolResult::success(data, usage)
                        .as_replayed()
                        .with_idempotency_key(key.clone());
                }
                Ok(None) => {}
                Err(err) => return self.fail(err, started),
            }
        }

        if let Err(err) = self.limiter.acquire(tool_id).await {
            return self.fail(err, started);
        }
        let span_token = self.tracer.start_span(&spec.name, ctx).await;

        let breaker = self.circuit_breaker_for(&spec);
        let retry_policy = retry_policy_for(&spec.retry.strategy, &spec.retry);
        let timeout = spec.timeout();

        let mut attempt: u32 = 0;
        let mut retries: u32 = 0;
        let mut circuit_opened = false;
        let outcome: Result<Value> = loop {
            attempt += 1;

            if let Err(err) = breaker.allow_request() {
                circuit_opened = true;
                break Err(err);
            }

            let executor = match self.executor_for(&spec) {
                Ok(executor) => executor,
                Err(err) => break Err(err),
            };

            let call_started = Instant::now();
            let result = tokio::time::timeout(timeout, executor.execute(&spec, &arguments, ctx)).await;
            let result = match result {
                Ok(inner) => inner,
                Err(_) => Err(RuntimeError::Timeout {
                    tool_name: spec.name.clone(),
                    elapsed_ms: call_started.elapsed().as_millis() as u64,
                    limit_ms: timeout.as_millis() as u64,
                }),
            };

            match result {
                Ok(value) => {
                    breaker.on_success();
                    break Ok(value);
                }
                Err(err) => {
                    breaker.on_failure();
                    if retry_policy.should_retry(attempt, &err) {
                        retries += 1;
                        tokio::time::sleep(retry_policy.delay_for(attempt)).await;
                        continue;
                    }
                    break Err(err);
                }
            }
        };

        self.limiter.release(tool_id).await;

        let success = outcome.is_ok();
        self.tracer.end_span(&span_token, success).await;
        self.metrics
            .observe_duration(
                "tool.call.duration",
                started.elapsed(),
                &[("tool", &spec.id), ("success", if success { "true" } else { "false" })],
            )
            .await;
        self.metrics
            .increment(
                if success { "tool.call.success" } else { "tool.call.failure" },
                &[("tool", &spec.id)],
            )
            .await;

        let usage = ToolUsage {
            attempts: attempt,
            retries,
            duration_ms: started.elapsed().as_millis() as u64,
            circuit_opened,
            ..ToolUsage::default()
        };

        match outcome {
            Ok(value) => {
                if let Some(key) = &idempotency_key {
                    let stored = if spec.persist_result {
                        value.clone()
                    } else {
                        sentinel_value()
                    };
                    let _ = self.memory.set(key, stored, None).await;
                }
                let mut result = ToolResult::success(value, usage).with_return_type(spec.return_type);
                if let Some(key) = idempotency_key {
                    result = result.with_idempotency_key(key);
                }
                result
            }
            Err(err) => ToolResult::failure(err.into(), usage),
        }
    }

    fn fail(&self, err: RuntimeError, started: Instant) -> ToolResult {
        ToolResult::failure(
            err.into(),
            ToolUsage {
                attempts: 0,
                retries: 0,
                duration_ms: started.elapsed().as_millis() as u64,
            },
        )
    }

    fn circuit_breaker_for(&self, spec: &toolrt_core::ToolSpec) -> Arc<dyn CircuitBreaker> {
        let strategy = if spec.circuit_breaker.adaptive {
            "adaptive"
        } else {
            "standard"
        };
        self.circuit_breakers
            .get_or_create(&spec.id, strategy, &spec.circuit_breaker)
    }

    fn executor_for(&self, spec: &toolrt_core::ToolSpec) -> Result<Arc<dyn ToolExecutor>> {
        self.executors
            .get(spec.backend.type_name())
            .cloned()
            .ok_or_else(|| RuntimeError::InvalidOperation {
                operation: format!("no executor registered for backend {}", spec.backend.type_name()),
            })
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn reset_circuit_breaker(&self, tool_id: &str) {
        self.circuit_breakers.reset(tool_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::function::{sync_handler, FunctionToolExecutor};
    use crate::idempotency::InMemoryMemory;
    use crate::observability::{ConcurrencyLimiter, NoopMetrics, NoopTracer};
    use crate::security::NoopSecurity;
    use crate::validator::BasicValidator;
    use toolrt_core::{IdempotencyConfig, ToolBackend, ToolParameter, ToolSpec};

    fn add_spec() -> ToolSpec {
        ToolSpec {
            id: "calculator.add".into(),
            name: "add".into(),
            description: None,
            version: "1.0.0".into(),
            parameters: vec![
                ToolParameter::Number {
                    name: "a".into(),
                    description: None,
                    required: true,
                    default: None,
                    minimum: None,
                    maximum: None,
                },
                ToolParameter::Number {
                    name: "b".into(),
                    description: None,
                    required: true,
                    default: None,
                    minimum: None,
                    maximum: None,
                },
            ],
            backend: ToolBackend::Function {
                handler_name: "calculator_add".into(),
            },
            retry: Default::default(),
            circuit_breaker: Default::default(),
            idempotency: None,
            timeout_ms: Some(1000),
            return_type: Default::default(),
            return_target: Default::default(),
            persist_result: false,
            allowed_roles: vec![],
            allowed_tenants: vec![],
        }
    }

    fn build_runtime(spec: ToolSpec) -> ToolRuntime {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(spec).unwrap();

        let mut function_executor = FunctionToolExecutor::new();
        function_executor.register(
            "calculator_add",
            sync_handler(|args| {
                let a = args["a"].as_f64().unwrap();
                let b = args["b"].as_f64().unwrap();
                Ok(serde_json::json!({"sum": a + b}))
            }),
        );

        ToolRuntimeBuilder::new(
            registry,
            Arc::new(BasicValidator::new()),
            Arc::new(NoopSecurity),
            Arc::new(InMemoryMemory::new()),
            Arc::new(NoopMetrics),
            Arc::new(NoopTracer),
            Arc::new(ConcurrencyLimiter::new(10)),
        )
        .with_executor("function", Arc::new(function_executor))
        .build()
    }

    #[tokio::test]
    async fn test_calculator_add_succeeds() {
        let runtime = build_runtime(add_spec());
        let ctx = ToolContext::new("acme", "user-1");
        let result = runtime
            .call("calculator.add", serde_json::json!({"a": 2, "b": 3}), &ctx)
            .await;
        assert!(result.success);
        assert_eq!(result.data.unwrap()["sum"], 5.0);
        assert_eq!(result.usage.attempts, 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_failure_result_not_panic() {
        let runtime = build_runtime(add_spec());
        let ctx = ToolContext::new("acme", "user-1");
        let result = runtime.call("does.not.exist", serde_json::json!({}), &ctx).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap().code, toolrt_core::ErrorCode::ToolNotFound);
    }

    #[tokio::test]
    async fn test_missing_argument_fails_validation_before_execution() {
        let runtime = build_runtime(add_spec());
        let ctx = ToolContext::new("acme", "user-1");
        let result = runtime
            .call("calculator.add", serde_json::json!({"a": 2}), &ctx)
            .await;
        assert!(!result.success);
        assert_eq!(
            result.error.unwrap().code,
            toolrt_core::ErrorCode::ValidationError
        );
        assert_eq!(result.usage.attempts, 0);
    }

    #[tokio::test]
    async fn test_idempotent_replay_returns_cached_result_without_reexecuting() {
        let mut spec = add_spec();
        spec.idempotency = Some(IdempotencyConfig::Default);
        spec.persist_result = true;
        let runtime = build_runtime(spec);
        let ctx = ToolContext::new("acme", "user-1");
        let args = serde_json::json!({"a": 2, "b": 3});

        let first = runtime.call("calculator.add", args.clone(), &ctx).await;
        assert!(first.success);
        assert!(!first.replayed);

        let second = runtime.call("calculator.add", args, &ctx).await;
        assert!(second.success);
        assert!(second.replayed);
        assert_eq!(second.data, first.data);
        assert!(second.usage.idempotency_reused);
        assert!(second.usage.cached_hit);
    }

    #[tokio::test]
    async fn test_idempotent_replay_without_persist_returns_synthetic_result() {
        let mut spec = add_spec();
        spec.idempotency = Some(IdempotencyConfig::Default);
        spec.persist_result = false;
        let runtime = build_runtime(spec);
        let ctx = ToolContext::new("acme", "user-1");
        let args = serde_json::json!({"a": 2, "b": 3});

        let first = runtime.call("calculator.add", args.clone(), &ctx).await;
        assert!(first.success);
        assert!(!first.replayed);
        assert_eq!(first.data.unwrap()["sum"], 5.0);

        let second = runtime.call("calculator.add", args, &ctx).await;
        assert!(second.success);
        assert!(second.replayed);
        assert!(second.usage.idempotency_reused);
        assert_eq!(second.data, Some(serde_json::Value::Null));
    }

    #[tokio::test]
    async fn test_circuit_opens_after_repeated_failures() {
        let mut spec = add_spec();
        spec.circuit_breaker.failure_threshold = 2;
        spec.retry.max_attempts = 1;
        let registry = Arc::new(ToolRegistry::new());
        registry.register(spec).unwrap();

        let mut function_executor = FunctionToolExecutor::new();
        function_executor.register(
            "calculator_add",
            sync_handler(|_args| {
                Err(RuntimeError::Unavailable {
                    detail: "backend down".into(),
                })
            }),
        );

        let runtime = ToolRuntimeBuilder::new(
            registry,
            Arc::new(BasicValidator::new()),
            Arc::new(NoopSecurity),
            Arc::new(InMemoryMemory::new()),
            Arc::new(NoopMetrics),
            Arc::new(NoopTracer),
            Arc::new(ConcurrencyLimiter::new(10)),
        )
        .with_executor("function", Arc::new(function_executor))
        .build();

        let ctx = ToolContext::new("acme", "user-1");
        let args = serde_json::json!({"a": 1, "b": 1});

        let _ = runtime.call("calculator.add", args.clone(), &ctx).await;
        let _ = runtime.call("calculator.add", args.clone(), &ctx).await;
        let third = runtime.call("calculator.add", args, &ctx).await;

        assert!(!third.success);
        assert_eq!(third.error.unwrap().code, toolrt_core::ErrorCode::Unavailable);
        assert!(third.usage.circuit_opened);
    }
}
