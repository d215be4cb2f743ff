//! DynamoDB execution strategy.
//!
//! DynamoDB's `N` attribute type is a decimal string, not a binary float —
//! sending `0.1` as an IEEE-754 double round-trips as something like
//! `0.1000000000000000055511151231257827021181583404541015625` once AWS's
//! SDK converts it back. [`to_attribute_value`] sidesteps that by
//! stringifying JSON numbers directly off their `serde_json::Number`
//! representation before handing them to the SDK.

use super::DbStrategy;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_json::Value;
use std::collections::HashMap;
use toolrt_core::{Result, RuntimeError};

pub struct DynamoDbStrategy {
    client: Client,
    table_name: String,
}

impl DynamoDbStrategy {
    #[must_use]
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Builds a strategy from the ambient AWS environment (region,
    /// credentials chain) the way a long-running gateway process resolves
    /// its DynamoDB client once at startup.
    pub async fn from_env(table_name: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config), table_name)
    }
}

/// Recursively converts a JSON value into a DynamoDB [`AttributeValue`],
/// coercing every JSON number into DynamoDB's `N` decimal-string form
/// instead of round-tripping through `f64`.
pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute_value).collect()),
        Value::Object(map) => {
            let mut out = HashMap::new();
            for (k, v) in map {
                out.insert(k.clone(), to_attribute_value(v));
            }
            AttributeValue::M(out)
        }
    }
}

/// Inverse of [`to_attribute_value`]: decodes a DynamoDB attribute back
/// into JSON, parsing `N` strings as `serde_json::Number` rather than an
/// intermediate `f64`.
pub fn from_attribute_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => serde_json::Number::from_str_radix_checked(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.clone())),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::L(items) => Value::Array(items.iter().map(from_attribute_value).collect()),
        AttributeValue::M(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(k.clone(), from_attribute_value(v));
            }
            Value::Object(out)
        }
        _ => Value::Null,
    }
}

/// Parses a decimal string the way `serde_json::Number::from_str` would,
/// without pulling in a separate dependency for what is one `parse`.
trait NumberFromStrRadixChecked {
    fn from_str_radix_checked(s: &str) -> Option<serde_json::Number>;
}

impl NumberFromStrRadixChecked for serde_json::Number {
    fn from_str_radix_checked(s: &str) -> Option<serde_json::Number> {
        if let Ok(i) = s.parse::<i64>() {
            return Some(serde_json::Number::from(i));
        }
        s.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
    }
}

#[async_trait]
impl DbStrategy for DynamoDbStrategy {
    async fn execute(&self, query: &str, arguments: &Value) -> Result<Value> {
        let key_obj = arguments.as_object().ok_or_else(|| {
            RuntimeError::validation("DynamoDB arguments must be a JSON object")
        })?;
        let mut key = HashMap::new();
        for (k, v) in key_obj {
            key.insert(k.clone(), to_attribute_value(v));
        }

        tracing::debug!(table = %self.table_name, query, "dispatching DynamoDB GetItem");
        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| RuntimeError::Unavailable {
                detail: format!("DynamoDB request failed: {e}"),
            })?;

        match response.item() {
            Some(item) => Ok(from_attribute_value(&AttributeValue::M(item.clone()))),
            None => Ok(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_round_trips_exactly() {
        let original = serde_json::json!(42);
        let attr = to_attribute_value(&original);
        assert_eq!(attr, AttributeValue::N("42".to_string()));
        assert_eq!(from_attribute_value(&attr), original);
    }

    #[test]
    fn test_float_is_not_corrupted_by_binary_round_trip() {
        let original = serde_json::json!(0.1);
        let attr = to_attribute_value(&original);
        assert_eq!(attr, AttributeValue::N("0.1".to_string()));
    }

    #[test]
    fn test_nested_object_round_trips() {
        let original = serde_json::json!({"a": {"b": [1, 2, 3]}});
        let attr = to_attribute_value(&original);
        assert_eq!(from_attribute_value(&attr), original);
    }

    #[test]
    fn test_string_and_bool_values() {
        assert_eq!(
            to_attribute_value(&serde_json::json!("hi")),
            AttributeValue::S("hi".to_string())
        );
        assert_eq!(
            to_attribute_value(&serde_json::json!(true)),
            AttributeValue::Bool(true)
        );
    }
}
