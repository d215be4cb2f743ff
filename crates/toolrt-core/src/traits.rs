//! Collaborator interfaces the pipeline depends on but does not implement.
//!
//! Each trait is a seam: the gateway crate provides concrete
//! implementations (in-memory, noop, backend-specific), and the pipeline
//! only ever depends on these trait objects. This mirrors the Protocol
//! classes the original runtime defined for memory, metrics, tracing, and
//! rate limiting.

use crate::context::ToolContext;
use crate::error::Result;
use crate::spec::ToolSpec;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Key/value store backing idempotency replay. Implementations must treat
/// `set_if_absent` as atomic — it is the only operation the idempotency
/// layer uses to avoid a duplicate concurrent execution winning a race.
#[async_trait]
pub trait ToolMemory: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()>;
    /// Returns `true` if this call created the entry, `false` if an entry
    /// already existed (and nothing was overwritten).
    async fn set_if_absent(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<bool>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// Acquires a named mutual-exclusion scope for `key`, held for at most
    /// `ttl` before the acquisition itself fails. The idempotency layer
    /// holds this across lookup, execution, and persist so a second
    /// concurrent caller blocks until the first releases (by dropping the
    /// returned guard) and then re-reads the now-populated cache entry.
    async fn lock(&self, key: &str, ttl: Duration) -> Result<Box<dyn MemoryLock>>;
}

/// A held lock scope from [`ToolMemory::lock`]. Releasing is implicit: drop
/// the guard (or let it go out of scope) to release the lock.
pub trait MemoryLock: Send + Sync {}

/// Counters and histograms the pipeline emits at each stage boundary.
#[async_trait]
pub trait ToolMetrics: Send + Sync {
    async fn increment(&self, name: &str, tags: &[(&str, &str)]);
    async fn observe_duration(&self, name: &str, duration: Duration, tags: &[(&str, &str)]);
}

/// Distributed tracing span lifecycle around a single invocation.
#[async_trait]
pub trait ToolTracer: Send + Sync {
    async fn start_span(&self, name: &str, ctx: &ToolContext) -> String;
    async fn end_span(&self, span_token: &str, success: bool);
}

/// Per-tool concurrency/rate gate, consulted before dispatching to the
/// backend executor.
#[async_trait]
pub trait ToolLimiter: Send + Sync {
    /// Acquire permission to run, or fail fast if the tool is over its
    /// concurrency or rate budget.
    async fn acquire(&self, tool_id: &str) -> Result<()>;
    async fn release(&self, tool_id: &str);
}

/// Argument validation against a tool's declared parameter schema.
#[async_trait]
pub trait ToolValidator: Send + Sync {
    async fn validate(&self, spec: &ToolSpec, arguments: &Value) -> Result<()>;
}

/// Authorization gate: is this caller, in this context, allowed to invoke
/// this tool at all, and are its arguments allowed to leave the process.
#[async_trait]
pub trait ToolSecurity: Send + Sync {
    async fn authorize(&self, spec: &ToolSpec, ctx: &ToolContext) -> Result<()>;
    /// Egress check: is this tool, with these arguments, allowed to reach
    /// whatever external system it targets (a hook for future URL/host
    /// allow-lists). Runs after `authorize` and before idempotency lookup.
    async fn check_egress(&self, spec: &ToolSpec, arguments: &Value) -> Result<()>;
}
