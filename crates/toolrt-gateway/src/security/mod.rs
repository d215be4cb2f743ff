//! Authorization: deciding whether a caller may invoke a given tool.

use async_trait::async_trait;
use serde_json::Value;
use toolrt_core::{Result, RuntimeError, ToolContext, ToolSecurity, ToolSpec};

/// Allow-list based authorization: a tool with a non-empty `allowed_roles`
/// requires the caller to hold at least one of them, and a non-empty
/// `allowed_tenants` requires the caller's tenant to be on the list. Empty
/// lists mean "unrestricted" for that dimension.
#[derive(Debug, Default)]
pub struct BasicSecurity;

impl BasicSecurity {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolSecurity for BasicSecurity {
    async fn authorize(&self, spec: &ToolSpec, ctx: &ToolContext) -> Result<()> {
        if !spec.allowed_tenants.is_empty()
            && !spec
                .allowed_tenants
                .iter()
                .any(|t| t == ctx.tenant_id.as_str())
        {
            return Err(RuntimeError::Unauthorized {
                detail: format!("tenant {} is not allowed to call {}", ctx.tenant_id, spec.id),
            });
        }

        if !spec.allowed_roles.is_empty() {
            let has_role = spec.allowed_roles.iter().any(|r| ctx.has_role(r));
            if !has_role {
                return Err(RuntimeError::UnauthorizedRole {
                    detail: format!(
                        "caller roles {:?} do not include any of {:?}",
                        ctx.roles, spec.allowed_roles
                    ),
                });
            }
        }

        Ok(())
    }

    /// A hook for future URL/host allow-lists; the basic implementation
    /// accepts all egress, matching the original's `check_egress` stub.
    async fn check_egress(&self, _spec: &ToolSpec, _arguments: &Value) -> Result<()> {
        Ok(())
    }
}

/// Permits every call. Used in tests and for tools with no restrictions,
/// matching the original `NoOpSecurity` passthrough.
#[derive(Debug, Default)]
pub struct NoopSecurity;

#[async_trait]
impl ToolSecurity for NoopSecurity {
    async fn authorize(&self, _spec: &ToolSpec, _ctx: &ToolContext) -> Result<()> {
        Ok(())
    }

    async fn check_egress(&self, _spec: &ToolSpec, _arguments: &Value) -> Result<()> {
        Ok(())
    }
}

#[must_use]
pub fn security_for(strategy: &str) -> Box<dyn ToolSecurity> {
    match strategy {
        "noop" => Box::new(NoopSecurity),
        _ => Box::new(BasicSecurity::new()),
    }
}
