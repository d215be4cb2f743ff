//! Per-database-engine execution strategies for `ToolBackend::Db`.

pub mod dynamodb;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use toolrt_core::Result;

/// Executes a single query against one relational or document backend.
/// `arguments` are bound as named parameters; the exact binding syntax
/// (`$1`, `?`, a DynamoDB expression attribute) is the strategy's concern.
#[async_trait]
pub trait DbStrategy: Send + Sync {
    async fn execute(&self, query: &str, arguments: &Value) -> Result<Value>;
}

/// Looks up a [`DbStrategy`] by the driver name declared on
/// `ToolBackend::Db { driver, .. }`.
#[derive(Default)]
pub struct DbStrategyRegistry {
    strategies: HashMap<String, Arc<dyn DbStrategy>>,
}

impl DbStrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    pub fn register(&mut self, driver: impl Into<String>, strategy: Arc<dyn DbStrategy>) {
        self.strategies.insert(driver.into(), strategy);
    }

    #[must_use]
    pub fn get(&self, driver: &str) -> Option<Arc<dyn DbStrategy>> {
        self.strategies.get(driver).cloned()
    }
}
