//! Argument validation against a tool's declared parameter schema.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use toolrt_core::{Result, RuntimeError, ToolParameter, ToolSpec, ToolValidator};

/// Validates arguments against each [`ToolParameter`]'s constraints:
/// presence of required fields, type match, and the per-kind bounds
/// (`min_length`/`pattern`/`enum_values` for strings, `minimum`/`maximum`
/// for numbers, `min_items`/`max_items` for arrays, recursively for
/// objects).
#[derive(Debug, Default)]
pub struct BasicValidator;

impl BasicValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn validate_value(param: &ToolParameter, value: Option<&Value>) -> Result<()> {
        let Some(value) = value else {
            if param.is_required() {
                return Err(RuntimeError::validation(format!(
                    "missing required parameter: {}",
                    param.name()
                )));
            }
            return Ok(());
        };

        match param {
            ToolParameter::String {
                name,
                min_length,
                max_length,
                pattern,
                enum_values,
                coerce,
                ..
            } => {
                let owned;
                let s = match value.as_str() {
                    Some(s) => s,
                    None if *coerce => {
                        owned = match value {
                            Value::Number(n) => n.to_string(),
                            Value::Bool(b) => b.to_string(),
                            _ => {
                                return Err(RuntimeError::validation(format!(
                                    "parameter {name} cannot be coerced to a string"
                                )))
                            }
                        };
                        owned.as_str()
                    }
                    None => {
                        return Err(RuntimeError::validation(format!(
                            "parameter {name} must be a string"
                        )))
                    }
                };
                if let Some(min) = min_length {
                    if s.len() < *min {
                        return Err(RuntimeError::validation(format!(
                            "parameter {name} shorter than min_length {min}"
                        )));
                    }
                }
                if let Some(max) = max_length {
                    if s.len() > *max {
                        return Err(RuntimeError::validation(format!(
                            "parameter {name} longer than max_length {max}"
                        )));
                    }
                }
                if let Some(pattern) = pattern {
                    let re = Regex::new(pattern).map_err(|e| {
                        RuntimeError::validation(format!(
                            "parameter {name} has an invalid pattern {pattern}: {e}"
                        ))
                    })?;
                    if !re.is_match(s) {
                        return Err(RuntimeError::validation(format!(
                            "parameter {name} does not match pattern {pattern}"
                        )));
                    }
                }
                if let Some(values) = enum_values {
                    if !values.iter().any(|v| v == s) {
                        return Err(RuntimeError::validation(format!(
                            "parameter {name} not among allowed values"
                        )));
                    }
                }
                Ok(())
            }
            ToolParameter::Number {
                name,
                minimum,
                maximum,
                ..
            } => {
                let n = value.as_f64().ok_or_else(|| {
                    RuntimeError::validation(format!("parameter {name} must be a number"))
                })?;
                if let Some(min) = minimum {
                    if n < *min {
                        return Err(RuntimeError::validation(format!(
                            "parameter {name} below minimum {min}"
                        )));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        return Err(RuntimeError::validation(format!(
                            "parameter {name} above maximum {max}"
                        )));
                    }
                }
                Ok(())
            }
            ToolParameter::Integer {
                name,
                minimum,
                maximum,
                ..
            } => {
                let n = value.as_i64().ok_or_else(|| {
                    RuntimeError::validation(format!("parameter {name} must be an integer"))
                })?;
                if let Some(min) = minimum {
                    if n < *min {
                        return Err(RuntimeError::validation(format!(
                            "parameter {name} below minimum {min}"
                        )));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        return Err(RuntimeError::validation(format!(
                            "parameter {name} above maximum {max}"
                        )));
                    }
                }
                Ok(())
            }
            ToolParameter::Boolean { name, .. } => {
                if value.as_bool().is_none() {
                    return Err(RuntimeError::validation(format!(
                        "parameter {name} must be a boolean"
                    )));
                }
                Ok(())
            }
            ToolParameter::Array {
                name,
                items,
                min_items,
                max_items,
                unique_items,
                ..
            } => {
                let arr = value.as_array().ok_or_else(|| {
                    RuntimeError::validation(format!("parameter {name} must be an array"))
                })?;
                if let Some(min) = min_items {
                    if arr.len() < *min {
                        return Err(RuntimeError::validation(format!(
                            "parameter {name} has fewer than min_items {min}"
                        )));
                    }
                }
                if let Some(max) = max_items {
                    if arr.len() > *max {
                        return Err(RuntimeError::validation(format!(
                            "parameter {name} has more than max_items {max}"
                        )));
                    }
                }
                if *unique_items {
                    for i in 0..arr.len() {
                        for j in (i + 1)..arr.len() {
                            if arr[i] == arr[j] {
                                return Err(RuntimeError::validation(format!(
                                    "parameter {name} has duplicate items but unique_items is set"
                                )));
                            }
                        }
                    }
                }
                for element in arr {
                    Self::validate_value(items, Some(element))?;
                }
                Ok(())
            }
            ToolParameter::Object {
                name, properties, ..
            } => {
                let obj = value.as_object().ok_or_else(|| {
                    RuntimeError::validation(format!("parameter {name} must be an object"))
                })?;
                for prop in properties {
                    Self::validate_value(prop, obj.get(prop.name()))?;
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ToolValidator for BasicValidator {
    async fn validate(&self, spec: &ToolSpec, arguments: &Value) -> Result<()> {
        let obj = arguments.as_object().ok_or_else(|| {
            RuntimeError::validation("arguments must be a JSON object".to_string())
        })?;
        for param in &spec.parameters {
            Self::validate_value(param, obj.get(param.name()))?;
        }
        let declared: std::collections::HashSet<&str> =
            spec.parameters.iter().map(ToolParameter::name).collect();
        for key in obj.keys() {
            if !declared.contains(key.as_str()) {
                return Err(RuntimeError::validation(format!(
                    "argument {key} is not declared in this tool's parameter schema"
                )));
            }
        }
        Ok(())
    }
}

/// Passthrough validator for trusted internal callers or tests that supply
/// pre-validated arguments.
#[derive(Debug, Default)]
pub struct NoopValidator;

#[async_trait]
impl ToolValidator for NoopValidator {
    async fn validate(&self, _spec: &ToolSpec, _arguments: &Value) -> Result<()> {
        Ok(())
    }
}

/// Construct a [`ToolValidator`] by strategy name, matching the original
/// factory pattern used for idempotency/circuit-breaker policy selection.
#[must_use]
pub fn validator_for(strategy: &str) -> Box<dyn ToolValidator> {
    match strategy {
        "noop" => Box::new(NoopValidator),
        _ => Box::new(BasicValidator::new()),
    }
}
