//! `toolrt-core` — Shared kernel for the tool execution runtime.
//!
//! This crate owns all domain types shared between the pipeline and its
//! pluggable backends. No business logic lives here — only pure types,
//! traits, and errors; the gateway crate owns validation, security,
//! idempotency, retry, circuit breaking, and execution.
//!
//! # Module Map
//! - [`ids`] — Typed newtypes (TenantId, ToolId, RunId, …)
//! - [`error`] — `RuntimeError` / `ErrorCode` / `ToolError`
//! - [`spec`] — `ToolSpec`, `ToolParameter`, retry/circuit-breaker/idempotency config
//! - [`context`] — `ToolContext`, the per-call identity and deadline bag
//! - [`result`] — `ToolResult`, `ToolUsage`
//! - [`traits`] — collaborator interfaces: memory, metrics, tracer, limiter, validator, security

pub mod context;
pub mod error;
pub mod ids;
pub mod result;
pub mod spec;
pub mod traits;

pub use context::ToolContext;
pub use error::{ErrorCode, Result, RuntimeError, ToolError};
pub use ids::{RunId, SessionId, SpanId, TenantId, ToolId, TraceId, UserId};
pub use result::{ToolResult, ToolUsage};
pub use spec::{
    CircuitBreakerConfig, IdempotencyConfig, RetryConfig, ToolBackend, ToolParameter, ToolReturnTarget,
    ToolSpec,
};
pub use spec::ToolReturnType;
pub use traits::{
    MemoryLock, ToolLimiter, ToolMemory, ToolMetrics, ToolSecurity, ToolTracer, ToolValidator,
};
