//! Plan execution adapters
//!
//! A ToolAdapter exposes the discovered tool manifest and executes an approved
//! plan call by call, strictly in order. RegistryAdapter runs against a local
//! ToolRegistry; StaticToolAdapter only advertises the default refua manifest
//! and refuses execution (offline fallback when the refua runtime is absent).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::CampaignError;
use crate::tools::registry::ToolRegistry;

/// Tool names served by the refua runtime, used when discovery is unavailable.
pub const DEFAULT_TOOL_LIST: [&str; 6] = [
    "refua_validate_spec",
    "refua_fold",
    "refua_affinity",
    "refua_antibody_design",
    "refua_job",
    "refua_admet_profile",
];

/// One executed plan call with its full output payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub tool: String,
    pub args: Value,
    pub output: Value,
}

/// Capability executor seam: manifest discovery plus sequential plan execution.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Sorted tool manifest.
    fn available_tools(&self) -> Vec<String>;

    /// Execute every call in order. Stops at the first failure; an unsupported
    /// tool name or malformed call is fatal at execution time.
    async fn execute_plan(&self, plan: &Value) -> Result<Vec<ExecutionResult>, CampaignError>;
}

/// Adapter over an in-process ToolRegistry.
pub struct RegistryAdapter {
    registry: ToolRegistry,
}

impl RegistryAdapter {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    async fn execute_tool(&self, tool: &str, args: Value) -> Result<ExecutionResult, CampaignError> {
        let handler = self
            .registry
            .get(tool)
            .ok_or_else(|| CampaignError::UnsupportedTool(tool.to_string()))?;

        let result = handler.execute(args.clone()).await;
        let audit = json!({
            "event": "tool_audit",
            "tool": tool,
            "ok": result.is_ok(),
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        let output = result.map_err(CampaignError::ToolExecution)?;
        Ok(ExecutionResult {
            tool: tool.to_string(),
            args,
            output,
        })
    }
}

#[async_trait]
impl ToolAdapter for RegistryAdapter {
    fn available_tools(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    async fn execute_plan(&self, plan: &Value) -> Result<Vec<ExecutionResult>, CampaignError> {
        let calls = plan
            .get("calls")
            .and_then(Value::as_array)
            .ok_or_else(|| CampaignError::StructuralPlan("Plan must contain a 'calls' list.".to_string()))?;

        let mut results = Vec::with_capacity(calls.len());
        for entry in calls {
            let entry = entry.as_object().ok_or_else(|| {
                CampaignError::StructuralPlan("Each plan call must be an object.".to_string())
            })?;
            let tool = entry
                .get("tool")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    CampaignError::StructuralPlan(
                        "Each plan call must define a non-empty 'tool'.".to_string(),
                    )
                })?;
            let args = entry.get("args").cloned().unwrap_or_else(|| json!({}));
            if !args.is_object() {
                return Err(CampaignError::StructuralPlan(
                    "Each plan call 'args' must be an object.".to_string(),
                ));
            }
            results.push(self.execute_tool(tool, args).await?);
        }
        Ok(results)
    }
}

/// Fallback adapter used when the refua runtime is not installed: the manifest
/// stays available for planning and validation, execution is refused.
#[derive(Debug, Default)]
pub struct StaticToolAdapter;

#[async_trait]
impl ToolAdapter for StaticToolAdapter {
    fn available_tools(&self) -> Vec<String> {
        DEFAULT_TOOL_LIST.iter().map(|name| name.to_string()).collect()
    }

    async fn execute_plan(&self, _plan: &Value) -> Result<Vec<ExecutionResult>, CampaignError> {
        Err(CampaignError::ToolExecution(
            "Cannot execute plan because the refua tool runtime is missing.".to_string(),
        ))
    }
}
