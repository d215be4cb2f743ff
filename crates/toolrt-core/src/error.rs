//! Structured error hierarchy for the tool execution runtime.
//!
//! `RuntimeError` is the internal, richly-contexted error type used inside
//! the pipeline (validator, security, executors, policies). At the pipeline
//! boundary it collapses into [`ToolError`] — the flat `{message, code,
//! retryable}` triple the spec's data model promises callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable, wire-facing error codes. See the error taxonomy: each code has a
/// fixed retryability that [`RuntimeError::retryable`] and
/// [`ToolError::retryable`] agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    InsufficientPermissions,
    UnauthorizedRole,
    Timeout,
    Unavailable,
    ToolError,
    MathError,
    InvalidOperation,
    ToolNotFound,
}

impl ErrorCode {
    /// Whether this code is retryable by default, independent of any
    /// particular error instance's override.
    #[must_use]
    pub fn default_retryable(self) -> bool {
        matches!(self, Self::Timeout | Self::Unavailable)
    }
}

/// Primary internal error type for the tool execution runtime.
///
/// Every pipeline stage (validator, security, idempotency, executors,
/// retry, circuit breaker) returns `Result<_, RuntimeError>`. It carries
/// more context than the wire-facing [`ToolError`] (e.g. the offending
/// parameter name) so logs and traces stay useful; that context is dropped
/// when the error crosses the pipeline boundary.
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("validation failed: {detail}")]
    ValidationError { detail: String },

    #[error("unauthorized: {detail}")]
    Unauthorized { detail: String },

    #[error("insufficient permissions: {detail}")]
    InsufficientPermissions { detail: String },

    #[error("unauthorized role: {detail}")]
    UnauthorizedRole { detail: String },

    #[error("timeout: {tool_name} exceeded {elapsed_ms}ms (limit {limit_ms}ms)")]
    Timeout {
        tool_name: String,
        elapsed_ms: u64,
        limit_ms: u64,
    },

    #[error("unavailable: {detail}")]
    Unavailable { detail: String },

    #[error("tool error: {detail}")]
    ToolError { detail: String },

    #[error("math error: {detail}")]
    MathError { detail: String },

    #[error("invalid operation: {operation}")]
    InvalidOperation { operation: String },

    #[error("tool not found: {tool_id}")]
    ToolNotFound { tool_id: String },
}

impl RuntimeError {
    /// Stable error code for this variant.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ValidationError { .. } => ErrorCode::ValidationError,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::InsufficientPermissions { .. } => ErrorCode::InsufficientPermissions,
            Self::UnauthorizedRole { .. } => ErrorCode::UnauthorizedRole,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Unavailable { .. } => ErrorCode::Unavailable,
            Self::ToolError { .. } => ErrorCode::ToolError,
            Self::MathError { .. } => ErrorCode::MathError,
            Self::InvalidOperation { .. } => ErrorCode::InvalidOperation,
            Self::ToolNotFound { .. } => ErrorCode::ToolNotFound,
        }
    }

    /// Whether this specific error should be retried. Matches the code's
    /// default for every variant except [`Self::ToolError`], whose backend
    /// can mark a specific occurrence retryable (domain errors override the
    /// code-level default — see `spec.md` §4.4).
    #[must_use]
    pub fn retryable(&self) -> bool {
        match self {
            Self::ToolError { .. } => false,
            other => other.code().default_retryable(),
        }
    }

    /// Optional structured context for logs/traces.
    #[must_use]
    pub fn context(&self) -> Option<serde_json::Value> {
        match self {
            Self::Timeout {
                elapsed_ms,
                limit_ms,
                ..
            } => Some(serde_json::json!({
                "elapsed_ms": elapsed_ms,
                "limit_ms": limit_ms,
            })),
            Self::ToolNotFound { tool_id } => Some(serde_json::json!({ "tool_id": tool_id })),
            _ => None,
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::ValidationError {
            detail: detail.into(),
        }
    }

    pub fn tool_error(detail: impl Into<String>) -> Self {
        Self::ToolError {
            detail: detail.into(),
        }
    }
}

/// Flat, wire-facing error: `{message, code, retryable}` per `spec.md` §3.
///
/// A retryable [`ToolError`] may carry an explicit override via
/// [`ToolError::retryable_override`] — this is how a backend-reported
/// domain error communicates its own retryability independent of its code's
/// default (invariant used by the retry policy, `spec.md` §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    pub message: String,
    pub code: ErrorCode,
    pub retryable: bool,
}

impl ToolError {
    #[must_use]
    pub fn new(message: impl Into<String>, code: ErrorCode, retryable: bool) -> Self {
        Self {
            message: message.into(),
            code,
            retryable,
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.message, self.code)
    }
}

impl std::error::Error for ToolError {}

impl From<RuntimeError> for ToolError {
    fn from(err: RuntimeError) -> Self {
        let retryable = err.retryable();
        let code = err.code();
        Self {
            message: err.to_string(),
            code,
            retryable,
        }
    }
}

/// Alias for the internal pipeline result type.
pub type Result<T> = std::result::Result<T, RuntimeError>;
