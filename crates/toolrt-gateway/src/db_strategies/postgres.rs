//! PostgreSQL execution strategy.

use super::DbStrategy;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row, TypeInfo};
use toolrt_core::{Result, RuntimeError};

pub struct PostgresStrategy {
    pool: PgPool,
}

impl PostgresStrategy {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_json(row: &PgRow) -> Value {
    let mut obj = serde_json::Map::new();
    for column in row.columns() {
        let name = column.name();
        let value = match column.type_info().name() {
            "INT4" | "INT8" | "INT2" => row
                .try_get::<i64, _>(name)
                .map(Value::from)
                .unwrap_or(Value::Null),
            "FLOAT4" | "FLOAT8" | "NUMERIC" => row
                .try_get::<f64, _>(name)
                .map(Value::from)
                .unwrap_or(Value::Null),
            "BOOL" => row
                .try_get::<bool, _>(name)
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

/// Binds each argument value positionally in argument-map iteration order.
/// Callers are expected to write queries with `$1`, `$2`, … placeholders
/// matching that order — the runtime has no column-name introspection to
/// do named binding safely against arbitrary driver-level SQL.
fn bind_arguments<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    arguments: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
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
impl DbStrategy for PostgresStrategy {
    async fn execute(&self, query: &str, arguments: &Value) -> Result<Value> {
        let built = bind_arguments(sqlx::query(query), arguments);
        let rows = built
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RuntimeError::Unavailable {
                detail: format!("postgres query failed: {e}"),
            })?;
        Ok(Value::Array(rows.iter().map(row_to_json).collect()))
    }
}
