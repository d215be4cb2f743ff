//! Idempotency key derivation and the cache backing replay.
//!
//! A key generator turns `(spec, context, arguments)` into a deterministic
//! string; the pipeline uses that string as the cache key in a
//! [`toolrt_core::ToolMemory`] to detect and replay duplicate calls instead
//! of re-executing the backend.

mod memory;

pub use memory::{InMemoryMemory, NoopMemory};

use serde_json::Value;
use sha2::{Digest, Sha256};
use toolrt_core::{IdempotencyConfig, ToolContext, ToolSpec};

/// Derives a cache key for a single invocation.
pub trait IdempotencyKeyGenerator: Send + Sync {
    fn generate(&self, spec: &ToolSpec, ctx: &ToolContext, arguments: &Value) -> String;
}

/// Canonicalize a JSON value into a stable string by recursively sorting
/// object keys. `serde_json::Value`'s default map is already a `BTreeMap`
/// when the `preserve_order` feature is off, so `to_string` is already
/// canonical — this makes that invariant explicit rather than relying on
/// an absent Cargo feature flag to stay absent.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{:?}:{}", k, canonical_json(v)))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", body.join(","))
        }
        other => other.to_string(),
    }
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Marker stored under an idempotency key when `persist_result` is false: the
/// pipeline still needs to remember *that* the call happened so a duplicate
/// is replayed rather than re-executed, but the tool opted out of caching its
/// actual payload.
const SENTINEL_MARKER: &str = "__toolrt_idempotency_sentinel__";

#[must_use]
pub fn sentinel_value() -> Value {
    serde_json::json!({ "__toolrt_sentinel__": SENTINEL_MARKER })
}

#[must_use]
pub fn is_sentinel_value(value: &Value) -> bool {
    value
        .get("__toolrt_sentinel__")
        .and_then(Value::as_str)
        .is_some_and(|marker| marker == SENTINEL_MARKER)
}

/// Hashes `spec.id | tenant_id | user_id | session_id | canonical(arguments)`.
/// The default strategy: two calls from the same identity with the same
/// arguments collide, two calls with different identities never do.
#[derive(Debug, Default)]
pub struct DefaultKeyGenerator;

impl IdempotencyKeyGenerator for DefaultKeyGenerator {
    fn generate(&self, spec: &ToolSpec, ctx: &ToolContext, arguments: &Value) -> String {
        let session = ctx
            .session_id
            .as_ref()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default();
        let raw = format!(
            "{}|{}|{}|{}|{}",
            spec.id,
            ctx.tenant_id,
            ctx.user_id,
            session,
            canonical_json(arguments)
        );
        sha256_hex(&raw)
    }
}

/// Hashes only a caller-selected subset of argument fields. Useful when a
/// tool takes a field that should not participate in deduplication (e.g. a
/// client-side request nonce) without the generator needing to know the
/// tool's full schema.
#[derive(Debug)]
pub struct FieldBasedKeyGenerator {
    pub fields: Vec<String>,
}

impl IdempotencyKeyGenerator for FieldBasedKeyGenerator {
    fn generate(&self, spec: &ToolSpec, ctx: &ToolContext, arguments: &Value) -> String {
        let mut selected = serde_json::Map::new();
        if let Some(obj) = arguments.as_object() {
            for field in &self.fields {
                if let Some(v) = obj.get(field) {
                    selected.insert(field.clone(), v.clone());
                }
            }
        }
        let raw = format!(
            "{}|{}|{}",
            spec.id,
            ctx.tenant_id,
            canonical_json(&Value::Object(selected))
        );
        sha256_hex(&raw)
    }
}

/// Hashes the full canonical argument payload only, ignoring caller
/// identity. Appropriate for pure functions where identical input always
/// means an identical, safely-replayable output regardless of who asked.
#[derive(Debug, Default)]
pub struct HashBasedKeyGenerator;

impl IdempotencyKeyGenerator for HashBasedKeyGenerator {
    fn generate(&self, spec: &ToolSpec, _ctx: &ToolContext, arguments: &Value) -> String {
        let raw = format!("{}|{}", spec.id, canonical_json(arguments));
        sha256_hex(&raw)
    }
}

/// Construct a key generator from a tool's declared [`IdempotencyConfig`].
/// `Custom` strategies name a generator the caller must register
/// separately; the factory falls back to [`DefaultKeyGenerator`] for
/// unrecognized custom names rather than failing the whole pipeline over
/// an idempotency-layer misconfiguration.
#[must_use]
pub fn key_generator_for(config: &IdempotencyConfig) -> Box<dyn IdempotencyKeyGenerator> {
    match config {
        IdempotencyConfig::Default => Box::new(DefaultKeyGenerator),
        IdempotencyConfig::FieldBased { fields } => Box::new(FieldBasedKeyGenerator {
            fields: fields.clone(),
        }),
        IdempotencyConfig::HashBased => Box::new(HashBasedKeyGenerator),
        IdempotencyConfig::Custom { .. } => Box::new(DefaultKeyGenerator),
    }
}
