//! Backend execution strategies: one per [`toolrt_core::ToolBackend`] variant.

pub mod db;
pub mod function;
pub mod http;

use async_trait::async_trait;
use serde_json::Value;
use toolrt_core::{Result, ToolContext, ToolSpec};

/// Executes the backend-specific half of a tool call: given validated,
/// authorized arguments, produce a result payload or a [`toolrt_core::RuntimeError`].
/// Everything upstream (retry, circuit breaking, timeout) wraps this trait
/// without knowing which backend it talks to.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, spec: &ToolSpec, arguments: &Value, ctx: &ToolContext) -> Result<Value>;
}

pub use db::DbToolExecutor;
pub use function::FunctionToolExecutor;
pub use http::HttpToolExecutor;
