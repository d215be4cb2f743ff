//! Tool specification: the declarative description of a callable tool.
//!
//! A [`ToolSpec`] is backend-agnostic metadata plus a parameter schema; it
//! carries no executable code. The gateway crate maps `tool_type` to a
//! concrete executor at dispatch time.

use crate::error::{Result, RuntimeError};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A single named argument a tool accepts, with JSON-Schema-like
/// constraints. Modeled as a tagged union so each kind only carries the
/// constraints that make sense for it (a string can have `min_length`, a
/// number can have `minimum`; mixing them is a compile error, not a runtime
/// footgun).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolParameter {
    String {
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        required: bool,
        #[serde(default)]
        default: Option<String>,
        #[serde(default)]
        min_length: Option<usize>,
        #[serde(default)]
        max_length: Option<usize>,
        #[serde(default)]
        pattern: Option<String>,
        #[serde(default)]
        enum_values: Option<Vec<String>>,
        /// JSON-Schema-style format hint (`"email"`, `"uuid"`, …). Informational
        /// only — not enforced by the validator, just threaded through to the
        /// generated JSON Schema document.
        #[serde(default)]
        format: Option<String>,
        /// If true, a non-string argument (number, boolean) is accepted and
        /// treated as its string form rather than rejected.
        #[serde(default)]
        coerce: bool,
    },
    Number {
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        required: bool,
        #[serde(default)]
        default: Option<f64>,
        #[serde(default)]
        minimum: Option<f64>,
        #[serde(default)]
        maximum: Option<f64>,
    },
    Integer {
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        required: bool,
        #[serde(default)]
        default: Option<i64>,
        #[serde(default)]
        minimum: Option<i64>,
        #[serde(default)]
        maximum: Option<i64>,
    },
    Boolean {
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        required: bool,
        #[serde(default)]
        default: Option<bool>,
    },
    Array {
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        required: bool,
        items: Box<ToolParameter>,
        #[serde(default)]
        min_items: Option<usize>,
        #[serde(default)]
        max_items: Option<usize>,
        #[serde(default)]
        unique_items: bool,
    },
    Object {
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        required: bool,
        #[serde(default)]
        properties: Vec<ToolParameter>,
    },
}

impl ToolParameter {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::String { name, .. }
            | Self::Number { name, .. }
            | Self::Integer { name, .. }
            | Self::Boolean { name, .. }
            | Self::Array { name, .. }
            | Self::Object { name, .. } => name,
        }
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        match self {
            Self::String { required, .. }
            | Self::Number { required, .. }
            | Self::Integer { required, .. }
            | Self::Boolean { required, .. }
            | Self::Array { required, .. }
            | Self::Object { required, .. } => *required,
        }
    }
}

/// Who ultimately consumes a structured tool result once execution
/// finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolReturnTarget {
    Human,
    Llm,
    Agent,
    Step,
}

impl Default for ToolReturnTarget {
    fn default() -> Self {
        Self::Agent
    }
}

/// Shape of a tool's successful result content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolReturnType {
    Json,
    Text,
}

impl Default for ToolReturnType {
    fn default() -> Self {
        Self::Json
    }
}

/// Retry tuning for a single tool. Mirrors the exponential backoff policy's
/// parameters (`spec.md` §4.4) so each tool can opt out of the runtime
/// default without the retry module knowing about per-tool overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Policy name (`"none"`, `"fixed"`, `"exponential"`) selecting which
    /// [`crate`]-external retry strategy the gateway builds from this config.
    #[serde(default = "RetryConfig::default_strategy")]
    pub strategy: String,
    #[serde(default = "RetryConfig::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "RetryConfig::default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "RetryConfig::default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "RetryConfig::default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub jitter: bool,
}

impl RetryConfig {
    fn default_strategy() -> String {
        "exponential".to_string()
    }

    fn default_max_attempts() -> u32 {
        3
    }
    fn default_base_delay_ms() -> u64 {
        100
    }
    fn default_max_delay_ms() -> u64 {
        10_000
    }
    fn default_multiplier() -> f64 {
        2.0
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: Self::default_strategy(),
            max_attempts: Self::default_max_attempts(),
            base_delay_ms: Self::default_base_delay_ms(),
            max_delay_ms: Self::default_max_delay_ms(),
            multiplier: Self::default_multiplier(),
            jitter: true,
        }
    }
}

/// Circuit breaker tuning for a single tool (`spec.md` §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "CircuitBreakerConfig::default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "CircuitBreakerConfig::default_recovery_timeout_ms")]
    pub recovery_timeout_ms: u64,
    #[serde(default = "CircuitBreakerConfig::default_half_open_max_calls")]
    pub half_open_max_calls: u32,
    #[serde(default)]
    pub adaptive: bool,
}

impl CircuitBreakerConfig {
    fn default_failure_threshold() -> u32 {
        5
    }
    fn default_recovery_timeout_ms() -> u64 {
        30_000
    }
    fn default_half_open_max_calls() -> u32 {
        1
    }

    #[must_use]
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_millis(self.recovery_timeout_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: Self::default_failure_threshold(),
            recovery_timeout_ms: Self::default_recovery_timeout_ms(),
            half_open_max_calls: Self::default_half_open_max_calls(),
            adaptive: false,
        }
    }
}

/// Which key generator strategy derives the idempotency cache key
/// (`spec.md` §4.3, `original_source/core/tools/runtimes/idempotency/`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum IdempotencyConfig {
    Default,
    FieldBased { fields: Vec<String> },
    HashBased,
    Custom { generator_name: String },
}

/// Which execution backend a tool dispatches to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tool_type", rename_all = "snake_case")]
pub enum ToolBackend {
    Function {
        handler_name: String,
    },
    Http {
        url: String,
        method: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
    Db {
        driver: String,
        query: String,
        #[serde(default)]
        connection_ref: Option<String>,
    },
}

impl ToolBackend {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Function { .. } => "function",
            Self::Http { .. } => "http",
            Self::Db { .. } => "db",
        }
    }
}

/// Full declarative description of a callable tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    pub backend: ToolBackend,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    #[serde(default)]
    pub idempotency: Option<IdempotencyConfig>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub return_type: ToolReturnType,
    #[serde(default)]
    pub return_target: ToolReturnTarget,
    #[serde(default)]
    pub persist_result: bool,
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    #[serde(default)]
    pub allowed_tenants: Vec<String>,
}

impl ToolSpec {
    /// Structural validation independent of any particular call's
    /// arguments: non-empty id/name, a parseable semver version, and no
    /// duplicate parameter names.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(RuntimeError::validation("tool id must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(RuntimeError::validation("tool name must not be empty"));
        }
        Version::parse(&self.version).map_err(|e| {
            RuntimeError::validation(format!("invalid semver version {:?}: {e}", self.version))
        })?;

        let mut seen = std::collections::HashSet::new();
        for param in &self.parameters {
            if !seen.insert(param.name()) {
                return Err(RuntimeError::validation(format!(
                    "duplicate parameter name: {}",
                    param.name()
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(30_000))
    }
}
