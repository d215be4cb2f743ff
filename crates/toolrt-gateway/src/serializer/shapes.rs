//! Converts a [`ToolSpec`] into the function-calling JSON shape expected by
//! the three LLM providers this runtime's callers commonly integrate with.
//! This is a pure data transformation — no network calls, no provider
//! SDKs — kept here because it is downstream of the same parameter schema
//! the validator and tracer already understand.

use super::parameters_to_json_schema;
use serde_json::{json, Value};
use toolrt_core::ToolSpec;

/// OpenAI's `tools` array entry: `{type: "function", function: {name,
/// description, parameters}}`.
#[must_use]
pub fn to_openai_tool(spec: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": spec.name,
            "description": spec.description.clone().unwrap_or_default(),
            "parameters": parameters_to_json_schema(&spec.parameters),
        }
    })
}

/// Anthropic's `tools` array entry: flat `{name, description, input_schema}`.
#[must_use]
pub fn to_anthropic_tool(spec: &ToolSpec) -> Value {
    json!({
        "name": spec.name,
        "description": spec.description.clone().unwrap_or_default(),
        "input_schema": parameters_to_json_schema(&spec.parameters),
    })
}

/// Google's Gemini `functionDeclarations` entry: `{name, description,
/// parameters}`, same shape as OpenAI's inner `function` object.
#[must_use]
pub fn to_google_function_declaration(spec: &ToolSpec) -> Value {
    json!({
        "name": spec.name,
        "description": spec.description.clone().unwrap_or_default(),
        "parameters": parameters_to_json_schema(&spec.parameters),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolrt_core::{ToolBackend, ToolParameter};

    fn spec() -> ToolSpec {
        ToolSpec {
            id: "calculator.add".into(),
            name: "add".into(),
            description: Some("adds two numbers".into()),
            version: "1.0.0".into(),
            parameters: vec![ToolParameter::Number {
                name: "a".into(),
                description: None,
                required: true,
                default: None,
                minimum: None,
                maximum: None,
            }],
            backend: ToolBackend::Function {
                handler_name: "calculator_add".into(),
            },
            retry: Default::default(),
            circuit_breaker: Default::default(),
            idempotency: None,
            timeout_ms: None,
            return_type: Default::default(),
            return_target: Default::default(),
            persist_result: false,
            allowed_roles: vec![],
            allowed_tenants: vec![],
        }
    }

    #[test]
    fn test_openai_shape_nests_function_object() {
        let shape = to_openai_tool(&spec());
        assert_eq!(shape["type"], "function");
        assert_eq!(shape["function"]["name"], "add");
        assert_eq!(shape["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_anthropic_shape_is_flat_with_input_schema() {
        let shape = to_anthropic_tool(&spec());
        assert_eq!(shape["name"], "add");
        assert!(shape.get("input_schema").is_some());
        assert!(shape.get("function").is_none());
    }

    #[test]
    fn test_google_shape_uses_parameters_key() {
        let shape = to_google_function_declaration(&spec());
        assert_eq!(shape["name"], "add");
        assert!(shape.get("parameters").is_some());
    }
}
