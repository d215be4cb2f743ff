//! Default observability collaborators: metrics, tracing, and rate limiting.
//!
//! These are intentionally thin. Production deployments are expected to
//! supply their own [`toolrt_core::ToolMetrics`]/[`toolrt_core::ToolTracer`]
//! bound to their telemetry stack; these defaults make the runtime usable
//! (and its tests deterministic) without one.

mod limiter;

pub use limiter::ConcurrencyLimiter;

use async_trait::async_trait;
use std::time::Duration;
use toolrt_core::{ToolContext, ToolMetrics, ToolTracer};
use tracing::{info_span, Instrument};

/// Emits each counter/duration as a `tracing` event at debug level, so a
/// caller with an env-filter subscriber already sees pipeline activity
/// without wiring a dedicated metrics backend.
#[derive(Debug, Default)]
pub struct TracingMetrics;

#[async_trait]
impl ToolMetrics for TracingMetrics {
    async fn increment(&self, name: &str, tags: &[(&str, &str)]) {
        tracing::debug!(metric = name, ?tags, "counter incremented");
    }

    async fn observe_duration(&self, name: &str, duration: Duration, tags: &[(&str, &str)]) {
        tracing::debug!(
            metric = name,
            duration_ms = duration.as_millis() as u64,
            ?tags,
            "duration observed"
        );
    }
}

/// Drops every metric. Used in tests that don't care about telemetry.
#[derive(Debug, Default)]
pub struct NoopMetrics;

#[async_trait]
impl ToolMetrics for NoopMetrics {
    async fn increment(&self, _name: &str, _tags: &[(&str, &str)]) {}
    async fn observe_duration(&self, _name: &str, _duration: Duration, _tags: &[(&str, &str)]) {}
}

/// Opens a `tracing` span per invocation, keyed by the tool call's `run_id`.
/// The "span token" returned to the caller is the run id's string form,
/// since the pipeline needs something `Send + 'static` to hand back across
/// the `end_span` boundary without holding the actual `tracing::Span`.
#[derive(Debug, Default)]
pub struct TracingTracer;

#[async_trait]
impl ToolTracer for TracingTracer {
    async fn start_span(&self, name: &str, ctx: &ToolContext) -> String {
        let span = info_span!("tool_call", tool = name, run_id = %ctx.run_id, tenant = %ctx.tenant_id);
        let _entered = span.enter();
        tracing::info!("tool call started");
        drop(_entered);
        ctx.run_id.to_string()
    }

    async fn end_span(&self, span_token: &str, success: bool) {
        tracing::info!(run_id = span_token, success, "tool call finished");
    }
}

/// Records nothing. Used in tests that don't care about tracing.
#[derive(Debug, Default)]
pub struct NoopTracer;

#[async_trait]
impl ToolTracer for NoopTracer {
    async fn start_span(&self, _name: &str, _ctx: &ToolContext) -> String {
        String::new()
    }

    async fn end_span(&self, _span_token: &str, _success: bool) {}
}

/// Wraps an async block in a span and reports its outcome through a
/// [`ToolTracer`], mirroring how the original runtime's logger adapter
/// bracketed each executor call.
pub async fn traced<F, T>(tracer: &dyn ToolTracer, name: &str, ctx: &ToolContext, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let token = tracer.start_span(name, ctx).await;
    let span = info_span!("tool_execution", tool = name);
    let result = fut.instrument(span).await;
    tracer.end_span(&token, true).await;
    result
}
