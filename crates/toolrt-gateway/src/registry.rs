//! In-memory registry of available tools, keyed by tool id.

use dashmap::DashMap;
use std::sync::Arc;
use toolrt_core::{Result, RuntimeError, ToolSpec};

/// Holds every [`ToolSpec`] the runtime can dispatch to, validated at
/// registration time so a malformed spec never reaches the pipeline.
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, Arc<ToolSpec>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    pub fn register(&self, spec: ToolSpec) -> Result<()> {
        spec.validate()?;
        self.tools.insert(spec.id.clone(), Arc::new(spec));
        Ok(())
    }

    pub fn get(&self, tool_id: &str) -> Result<Arc<ToolSpec>> {
        self.tools
            .get(tool_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| RuntimeError::ToolNotFound {
                tool_id: tool_id.to_string(),
            })
    }

    pub fn remove(&self, tool_id: &str) {
        self.tools.remove(tool_id);
    }

    #[must_use]
    pub fn list(&self) -> Vec<Arc<ToolSpec>> {
        self.tools.iter().map(|entry| entry.value().clone()).collect()
    }
}
