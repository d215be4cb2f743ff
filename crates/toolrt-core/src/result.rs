//! Outcome types returned from a completed tool invocation.

use crate::error::ToolError;
use crate::spec::ToolReturnType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource accounting for a single invocation, surfaced to callers that
/// meter usage (billing, budget enforcement upstream of this runtime).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolUsage {
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub duration_ms: u64,
    /// Set when this invocation's result came from the idempotency cache
    /// rather than a fresh backend execution.
    #[serde(default)]
    pub cached_hit: bool,
    /// Set when the returned result is a replay of a prior invocation with
    /// an equal idempotency key, still within its TTL.
    #[serde(default)]
    pub idempotency_reused: bool,
    /// Set when this invocation was rejected fast because its tool's
    /// circuit breaker was open.
    #[serde(default)]
    pub circuit_opened: bool,
}

/// The result of a single tool invocation: success xor failure, plus usage
/// accounting. Mirrors `spec.md` §3's `ToolResult` shape — callers branch on
/// `success` rather than matching a Rust enum, since this type crosses the
/// wire as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    #[serde(default)]
    pub usage: ToolUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub replayed: bool,
    #[serde(default)]
    pub return_type: ToolReturnType,
}

impl ToolResult {
    #[must_use]
    pub fn success(data: Value, usage: ToolUsage) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            usage,
            idempotency_key: None,
            replayed: false,
            return_type: ToolReturnType::default(),
        }
    }

    #[must_use]
    pub fn failure(error: ToolError, usage: ToolUsage) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            usage,
            idempotency_key: None,
            replayed: false,
            return_type: ToolReturnType::default(),
        }
    }

    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn as_replayed(mut self) -> Self {
        self.replayed = true;
        self
    }

    #[must_use]
    pub fn with_return_type(mut self, return_type: ToolReturnType) -> Self {
        self.return_type = return_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_success_result_has_no_error() {
        let result = ToolResult::success(serde_json::json!({"sum": 4}), ToolUsage::default());
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.data.unwrap()["sum"], 4);
    }

    #[test]
    fn test_failure_result_has_no_data() {
        let error = ToolError::new("boom", ErrorCode::ToolError, false);
        let result = ToolResult::failure(error, ToolUsage::default());
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error.unwrap().code, ErrorCode::ToolError);
    }

    #[test]
    fn test_as_replayed_marks_flag() {
        let result =
            ToolResult::success(serde_json::json!(null), ToolUsage::default()).as_replayed();
        assert!(result.replayed);
    }

    #[test]
    fn test_serialization_omits_absent_error() {
        let result = ToolResult::success(serde_json::json!(1), ToolUsage::default());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("error").is_none());
    }
}
