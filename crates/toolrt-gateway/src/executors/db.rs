//! Relational/document database backend.

use super::ToolExecutor;
use crate::db_strategies::DbStrategyRegistry;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use toolrt_core::{Result, RuntimeError, ToolBackend, ToolContext, ToolSpec};

/// Dispatches `ToolBackend::Db { driver, query, .. }` to the registered
/// [`crate::db_strategies::DbStrategy`] for that driver. The executor
/// itself is driver-agnostic — it only resolves which strategy to call.
pub struct DbToolExecutor {
    strategies: Arc<DbStrategyRegistry>,
}

impl DbToolExecutor {
    #[must_use]
    pub fn new(strategies: Arc<DbStrategyRegistry>) -> Self {
        Self { strategies }
    }
}

#[async_trait]
impl ToolExecutor for DbToolExecutor {
    async fn execute(&self, spec: &ToolSpec, arguments: &Value, _ctx: &ToolContext) -> Result<Value> {
        let ToolBackend::Db { driver, query, .. } = &spec.backend else {
            return Err(RuntimeError::InvalidOperation {
                operation: format!("{} is not a db tool", spec.id),
            });
        };
        let strategy = self.strategies.get(driver).ok_or_else(|| {
            RuntimeError::InvalidOperation {
                operation: format!("no db strategy registered for driver {driver}"),
            }
        })?;
        strategy.execute(query, arguments).await
    }
}
