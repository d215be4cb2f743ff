//! MySQL execution strategy.

use super::DbStrategy;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, MySqlPool, Row, TypeInfo};
use toolrt_core::{Result, RuntimeError};

pub struct MySqlStrategy {
    pool: MySqlPool,
}

impl MySqlStrategy {
    #[must_use]
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn row_to_json(row: &MySqlRow) -> Value {
    let mut obj = serde_json::Map::new();
    for column in row.columns() {
        let name = column.name();
        let value = match column.type_info().name() {
            "TINYINT" | "SMALLINT" | "INT" | "BIGINT" => row
                .try_get::<i64, _>(name)
                .map(Value::from)
                .unwrap_or(Value::Null),
            "FLOAT" | "DOUBLE" | "DECIMAL" => row
                .try_get::<f64, _>(name)
                .map(Value::from)
                .unwrap_or(Value::Null),
            _ => row
                .try_get::<String, _>(name)
                .map(Value::from)
                .unwrap_or(Value::Null),
        };
        obj.insert(name.to_string(), value);
    }
    Value::Object(obj)
}

fn bind_arguments<'q>(
    mut query: sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments>,
    arguments: &'q Value,
) -> sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments> {
    if let Some(obj) = arguments.as_object() {
        for value in obj.values() {
            query = match value {
                Value::String(s) => query.bind(s.as_str()),
                Value::Number(n) if n.is_i64() => query.bind(n.as_i64()),
                Value::Number(n) => query.bind(n.as_f64()),
                Value::Bool(b) => query.bind(*b),
                Value::Null => query.bind(Option::<String>::None),
                other => query.bind(other.to_string()),
            };
        }
    }
    query
}

#[async_trait]
impl DbStrategy for MySqlStrategy {
    async fn execute(&self, query: &str, arguments: &Value) -> Result<Value> {
        let built = bind_arguments(sqlx::query(query), arguments);
        let rows = built
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RuntimeError::Unavailable {
                detail: format!("mysql query failed: {e}"),
            })?;
        Ok(Value::Array(rows.iter().map(row_to_json).collect()))
    }
}
