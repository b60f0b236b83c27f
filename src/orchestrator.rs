//! Single-pass campaign orchestration
//!
//! One planner call, one structural parse, then sequential tool execution.
//! The autonomous planner/critic loop lives in `autonomy`; this path is the
//! direct plan-and-execute cycle behind the `run` command.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::core::CampaignError;
use crate::openclaw::OpenClawApi;
use crate::parsing::extract_json_plan;
use crate::prompts::planner_suffix;
use crate::tools::{ExecutionResult, ToolAdapter};

/// Full record of one plan+execute cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignRun {
    pub objective: String,
    pub system_prompt: String,
    pub planner_response_text: String,
    pub plan: Value,
    pub results: Vec<ExecutionResult>,
}

pub struct CampaignOrchestrator {
    openclaw: Arc<dyn OpenClawApi>,
    adapter: Arc<dyn ToolAdapter>,
}

impl CampaignOrchestrator {
    pub fn new(openclaw: Arc<dyn OpenClawApi>, adapter: Arc<dyn ToolAdapter>) -> Self {
        Self { openclaw, adapter }
    }

    /// Ask the planner for a tool plan. Returns the raw response text alongside
    /// the parsed plan so callers can persist both.
    pub async fn plan(
        &self,
        objective: &str,
        system_prompt: &str,
    ) -> Result<(String, Value), CampaignError> {
        let instructions = format!(
            "{}\n\n{}",
            system_prompt.trim(),
            planner_suffix(&self.adapter.available_tools())
        );
        let response = self
            .openclaw
            .create_response(
                objective,
                &instructions,
                json!({"component": "ClawCures", "phase": "plan"}),
            )
            .await?;
        let plan = extract_json_plan(&response.text)?;
        Ok((response.text, plan))
    }

    pub async fn plan_and_execute(
        &self,
        objective: &str,
        system_prompt: &str,
    ) -> Result<CampaignRun, CampaignError> {
        let (planner_text, plan) = self.plan(objective, system_prompt).await?;
        let results = self.execute_plan(&plan).await?;
        Ok(CampaignRun {
            objective: objective.to_string(),
            system_prompt: system_prompt.to_string(),
            planner_response_text: planner_text,
            plan,
            results,
        })
    }

    pub async fn execute_plan(&self, plan: &Value) -> Result<Vec<ExecutionResult>, CampaignError> {
        self.adapter.execute_plan(plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openclaw::MockOpenClaw;
    use crate::tools::{RegistryAdapter, Tool, ToolRegistry};
    use async_trait::async_trait;

    struct ValidateTool;

    #[async_trait]
    impl Tool for ValidateTool {
        fn name(&self) -> &str {
            "refua_validate_spec"
        }
        fn description(&self) -> &str {
            "spec validation stub"
        }
        async fn execute(&self, _args: Value) -> Result<Value, String> {
            Ok(json!({"valid": true}))
        }
    }

    fn orchestrator(plan_text: &str) -> CampaignOrchestrator {
        let mut registry = ToolRegistry::new();
        registry.register(ValidateTool);
        CampaignOrchestrator::new(
            Arc::new(MockOpenClaw::new(plan_text, "{}")),
            Arc::new(RegistryAdapter::new(registry)),
        )
    }

    #[tokio::test]
    async fn plan_parses_json_and_tags_metadata() {
        let mock = Arc::new(MockOpenClaw::new(
            r#"{"calls":[{"tool":"refua_validate_spec","args":{}}]}"#,
            "{}",
        ));
        let mut registry = ToolRegistry::new();
        registry.register(ValidateTool);
        let orchestrator =
            CampaignOrchestrator::new(mock.clone(), Arc::new(RegistryAdapter::new(registry)));

        let (text, plan) = orchestrator.plan("cure everything", "Be rigorous.").await.unwrap();
        assert!(text.contains("refua_validate_spec"));
        assert_eq!(plan["calls"].as_array().unwrap().len(), 1);

        let calls = mock.captured();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].metadata["component"], "ClawCures");
        assert_eq!(calls[0].metadata["phase"], "plan");
        assert!(calls[0].instructions.contains("Allowed tools: refua_validate_spec."));
    }

    #[tokio::test]
    async fn plan_and_execute_records_results() {
        let orchestrator =
            orchestrator(r#"{"calls":[{"tool":"refua_validate_spec","args":{"spec":"x"}}]}"#);
        let run = orchestrator
            .plan_and_execute("cure everything", "Be rigorous.")
            .await
            .unwrap();
        assert_eq!(run.results.len(), 1);
        assert_eq!(run.results[0].output["valid"], true);
    }

    #[tokio::test]
    async fn prose_plan_is_a_structural_error() {
        let orchestrator = orchestrator("I cannot produce a plan right now.");
        let err = orchestrator.plan("objective", "prompt").await.unwrap_err();
        assert!(matches!(err, CampaignError::StructuralPlan(_)));
    }
}
