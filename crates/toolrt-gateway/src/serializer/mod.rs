//! Converts a [`ToolSpec`] into the JSON Schema shape that drives both
//! argument validation documentation and LLM function-calling payloads.

pub mod shapes;

use serde_json::{json, Value};
use toolrt_core::ToolParameter;

fn parameter_schema(param: &ToolParameter) -> Value {
    match param {
        ToolParameter::String {
            description,
            min_length,
            max_length,
            pattern,
            enum_values,
            format,
            ..
        } => {
            let mut schema = json!({ "type": "string" });
            set_optional(&mut schema, "description", description.clone());
            set_optional(&mut schema, "minLength", *min_length);
            set_optional(&mut schema, "maxLength", *max_length);
            set_optional(&mut schema, "pattern", pattern.clone());
            set_optional(&mut schema, "enum", enum_values.clone());
            set_optional(&mut schema, "format", format.clone());
            schema
        }
        ToolParameter::Number {
            description,
            minimum,
            maximum,
            ..
        } => {
            let mut schema = json!({ "type": "number" });
            set_optional(&mut schema, "description", description.clone());
            set_optional(&mut schema, "minimum", *minimum);
            set_optional(&mut schema, "maximum", *maximum);
            schema
        }
        ToolParameter::Integer {
            description,
            minimum,
            maximum,
            ..
        } => {
            let mut schema = json!({ "type": "integer" });
            set_optional(&mut schema, "description", description.clone());
            set_optional(&mut schema, "minimum", *minimum);
            set_optional(&mut schema, "maximum", *maximum);
            schema
        }
        ToolParameter::Boolean { description, .. } => {
            let mut schema = json!({ "type": "boolean" });
            set_optional(&mut schema, "description", description.clone());
            schema
        }
        ToolParameter::Array {
            description,
            items,
            min_items,
            max_items,
            unique_items,
            ..
        } => {
            let mut schema = json!({
                "type": "array",
                "items": parameter_schema(items),
            });
            set_optional(&mut schema, "description", description.clone());
            set_optional(&mut schema, "minItems", *min_items);
            set_optional(&mut schema, "maxItems", *max_items);
            if *unique_items {
                schema["uniqueItems"] = Value::Bool(true);
            }
            schema
        }
        ToolParameter::Object {
            description,
            properties,
            ..
        } => {
            let mut props = serde_json::Map::new();
            let mut required = Vec::new();
            for prop in properties {
                props.insert(prop.name().to_string(), parameter_schema(prop));
                if prop.is_required() {
                    required.push(Value::String(prop.name().to_string()));
                }
            }
            let mut schema = json!({
                "type": "object",
                "properties": props,
            });
            set_optional(&mut schema, "description", description.clone());
            if !required.is_empty() {
                schema["required"] = Value::Array(required);
            }
            schema
        }
    }
}

fn set_optional<T: Into<Value>>(schema: &mut Value, key: &str, value: Option<T>) {
    if let Some(v) = value {
        schema[key] = v.into();
    }
}

/// Builds the top-level JSON Schema `{type: object, properties, required}`
/// document for a tool's parameter list.
#[must_use]
pub fn parameters_to_json_schema(parameters: &[ToolParameter]) -> Value {
    let mut props = serde_json::Map::new();
    let mut required = Vec::new();
    for param in parameters {
        props.insert(param.name().to_string(), parameter_schema(param));
        if param.is_required() {
            required.push(Value::String(param.name().to_string()));
        }
    }
    let mut schema = json!({
        "type": "object",
        "properties": props,
    });
    if !required.is_empty() {
        schema["required"] = Value::Array(required);
    }
    schema
}

/// Validates that a generated schema document is itself well-formed JSON
/// Schema, using the `jsonschema` crate's meta-schema validator. This
/// catches a malformed [`ToolParameter`] translation (e.g. a `pattern`
/// that isn't valid regex syntax) before it reaches a model provider.
pub fn validate_schema_document(schema: &Value) -> Result<(), String> {
    jsonschema::meta::validate(schema).map_err(|e| e.to_string())
}
