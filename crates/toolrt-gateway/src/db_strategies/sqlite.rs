//! SQLite execution strategy.
//!
//! The default backend for local development and single-process tests —
//! the original runtime treated it as the "quickstart" driver, and this
//! strategy's tests run against a real in-memory database rather than a
//! stub.

use super::DbStrategy;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo};
use toolrt_core::{Result, RuntimeError};

pub struct SqliteStrategy {
    pool: SqlitePool,
}

impl SqliteStrategy {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_json(row: &SqliteRow) -> Value {
    let mut obj = serde_json::Map::new();
    for column in row.columns() {
        let name = column.name();
        let value = match column.type_info().name() {
            "INTEGER" => row
                .try_get::<i64, _>(name)
                .map(Value::from)
                .unwrap_or(Value::Null),
            "REAL" => row
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
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    arguments: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
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
impl DbStrategy for SqliteStrategy {
    async fn execute(&self, query: &str, arguments: &Value) -> Result<Value> {
        let built = bind_arguments(sqlx::query(query), arguments);
        let rows = built
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RuntimeError::Unavailable {
                detail: format!("sqlite query failed: {e}"),
            })?;
        Ok(Value::Array(rows.iter().map(row_to_json).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_pool() -> SqlitePool {
        SqlitePool::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_select_against_seeded_table_returns_rows() {
        let pool = memory_pool().await;
        sqlx::query("CREATE TABLE widgets (id INTEGER, name TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO widgets (id, name) VALUES (1, 'bolt')")
            .execute(&pool)
            .await
            .unwrap();

        let strategy = SqliteStrategy::new(pool);
        let result = strategy
            .execute("SELECT id, name FROM widgets", &serde_json::json!({}))
            .await
            .unwrap();
        let rows = result.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "bolt");
    }

    #[tokio::test]
    async fn test_invalid_sql_is_unavailable() {
        let pool = memory_pool().await;
        let strategy = SqliteStrategy::new(pool);
        let result = strategy
            .execute("SELECT * FROM nonexistent_table", &serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(RuntimeError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_bound_argument_filters_results() {
        let pool = memory_pool().await;
        sqlx::query("CREATE TABLE widgets (id INTEGER, name TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO widgets (id, name) VALUES (1, 'bolt'), (2, 'nut')")
            .execute(&pool)
            .await
            .unwrap();

        let strategy = SqliteStrategy::new(pool);
        let result = strategy
            .execute(
                "SELECT id, name FROM widgets WHERE name = ?",
                &serde_json::json!({"name": "nut"}),
            )
            .await
            .unwrap();
        let rows = result.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 2);
    }
}
