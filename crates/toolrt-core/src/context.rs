//! Per-call context threaded through the execution pipeline.

use crate::ids::{RunId, SessionId, SpanId, TenantId, TraceId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Everything the pipeline needs about the caller and the call's identity,
/// distinct from the tool's own arguments. Constructed once per invocation
/// by the caller (an agent loop, an API handler) and passed by reference
/// through validation, security, idempotency, and execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolContext {
    pub run_id: RunId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub trace_id: Option<TraceId>,
    #[serde(default)]
    pub span_id: Option<SpanId>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auth: HashMap<String, Value>,
    #[serde(default)]
    pub extras: HashMap<String, Value>,
}

impl ToolContext {
    #[must_use]
    pub fn new(tenant_id: impl Into<TenantId>, user_id: impl Into<UserId>) -> Self {
        Self {
            run_id: RunId::new(),
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
            session_id: None,
            trace_id: None,
            span_id: None,
            roles: Vec::new(),
            locale: None,
            timezone: None,
            deadline: None,
            auth: HashMap::new(),
            extras: HashMap::new(),
        }
    }

    /// Milliseconds remaining until `deadline`, or `None` if no deadline
    /// was set. A deadline in the past yields `Some(0)` rather than a
    /// negative number — the timeout layer treats that as "expire now".
    #[must_use]
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> Option<u64> {
        self.deadline.map(|d| {
            let delta = d.signed_duration_since(now);
            delta.num_milliseconds().max(0) as u64
        })
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_context_has_no_deadline() {
        let ctx = ToolContext::new("acme", "user-1");
        assert!(ctx.deadline.is_none());
        assert_eq!(ctx.remaining_ms(Utc::now()), None);
    }

    #[test]
    fn test_remaining_ms_clamps_past_deadline_to_zero() {
        let mut ctx = ToolContext::new("acme", "user-1");
        let now = Utc::now();
        ctx.deadline = Some(now - Duration::seconds(5));
        assert_eq!(ctx.remaining_ms(now), Some(0));
    }

    #[test]
    fn test_remaining_ms_future_deadline_is_positive() {
        let mut ctx = ToolContext::new("acme", "user-1");
        let now = Utc::now();
        ctx.deadline = Some(now + Duration::seconds(2));
        assert_eq!(ctx.remaining_ms(now), Some(2000));
    }

    #[test]
    fn test_has_role_checks_membership() {
        let mut ctx = ToolContext::new("acme", "user-1");
        ctx.roles.push("admin".into());
        assert!(ctx.has_role("admin"));
        assert!(!ctx.has_role("viewer"));
    }
}
