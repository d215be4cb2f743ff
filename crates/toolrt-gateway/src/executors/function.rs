//! In-process function backend: dispatches to a registered Rust closure.

use super::ToolExecutor;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use toolrt_core::{Result, RuntimeError, ToolBackend, ToolContext, ToolSpec};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A registered tool handler: arguments in, result payload out.
pub type HandlerFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Dispatches `ToolBackend::Function { handler_name }` to a closure
/// registered ahead of time. This is the backend used by in-process tools
/// like the calculator — no network or database round trip, just a Rust
/// function called directly.
#[derive(Clone, Default)]
pub struct FunctionToolExecutor {
    handlers: HashMap<String, HandlerFn>,
}

impl FunctionToolExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, handler: HandlerFn) {
        self.handlers.insert(name.into(), handler);
    }
}

#[async_trait]
impl ToolExecutor for FunctionToolExecutor {
    async fn execute(&self, spec: &ToolSpec, arguments: &Value, _ctx: &ToolContext) -> Result<Value> {
        let ToolBackend::Function { handler_name } = &spec.backend else {
            return Err(RuntimeError::InvalidOperation {
                operation: format!("{} is not a function tool", spec.id),
            });
        };
        let handler = self.handlers.get(handler_name).ok_or_else(|| {
            RuntimeError::InvalidOperation {
                operation: format!("no handler registered for {handler_name}"),
            }
        })?;
        handler(arguments.clone()).await
    }
}

/// Builds a [`HandlerFn`] out of a synchronous closure, for handlers with
/// no need for `.await` inside (most pure-function tools).
pub fn sync_handler<F>(f: F) -> HandlerFn
where
    F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(move |args| {
        let result = f(args);
        Box::pin(async move { result })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolrt_core::ToolContext;

    fn spec() -> ToolSpec {
        ToolSpec {
            id: "calculator.divide".into(),
            name: "divide".into(),
            description: None,
            version: "1.0.0".into(),
            parameters: vec![],
            backend: ToolBackend::Function {
                handler_name: "calculator_divide".into(),
            },
            retry: Default::default(),
            circuit_breaker: Default::default(),
            idempotency: None,
            timeout_ms: None,
            return_type: Default::default(),
            return_target: Default::default(),
            persist_result: false,
            allowed_roles: vec![],
            allowed_tenants: vec![],
        }
    }

    #[tokio::test]
    async fn test_registered_handler_is_invoked() {
        let mut executor = FunctionToolExecutor::new();
        executor.register(
            "calculator_divide",
            sync_handler(|args| {
                let a = args["a"].as_f64().unwrap();
                let b = args["b"].as_f64().unwrap();
                if b == 0.0 {
                    return Err(RuntimeError::MathError {
                        detail: "division by zero".into(),
                    });
                }
                Ok(serde_json::json!({ "result": a / b }))
            }),
        );
        let ctx = ToolContext::new("acme", "user-1");
        let result = executor
            .execute(&spec(), &serde_json::json!({"a": 10, "b": 2}), &ctx)
            .await
            .unwrap();
        assert_eq!(result["result"], 5.0);
    }

    #[tokio::test]
    async fn test_division_by_zero_yields_math_error() {
        let mut executor = FunctionToolExecutor::new();
        executor.register(
            "calculator_divide",
            sync_handler(|args| {
                let a = args["a"].as_f64().unwrap();
                let b = args["b"].as_f64().unwrap();
                if b == 0.0 {
                    return Err(RuntimeError::MathError {
                        detail: "division by zero".into(),
                    });
                }
                Ok(serde_json::json!({ "result": a / b }))
            }),
        );
        let ctx = ToolContext::new("acme", "user-1");
        let result = executor
            .execute(&spec(), &serde_json::json!({"a": 1, "b": 0}), &ctx)
            .await;
        assert!(matches!(result, Err(RuntimeError::MathError { .. })));
    }

    #[tokio::test]
    async fn test_missing_handler_is_invalid_operation() {
        let executor = FunctionToolExecutor::new();
        let ctx = ToolContext::new("acme", "user-1");
        let result = executor
            .execute(&spec(), &serde_json::json!({}), &ctx)
            .await;
        assert!(matches!(result, Err(RuntimeError::InvalidOperation { .. })));
    }
}
