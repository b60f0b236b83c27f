//! End-to-end campaign tests: autonomous loop through plan execution and
//! promising-cure extraction, all against the scripted responder.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use clawcures::autonomy::{AutonomousPlanner, PlanPolicy};
use clawcures::cures::{extract_promising_cures, summarize_promising_cures, DEFAULT_MIN_SCORE};
use clawcures::openclaw::MockOpenClaw;
use clawcures::tools::{RegistryAdapter, Tool, ToolAdapter, ToolRegistry};

struct ValidateSpecTool;

#[async_trait]
impl Tool for ValidateSpecTool {
    fn name(&self) -> &str {
        "refua_validate_spec"
    }
    fn description(&self) -> &str {
        "validates a design spec"
    }
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        Ok(json!({"valid": true, "issues": []}))
    }
}

struct AffinityTool;

#[async_trait]
impl Tool for AffinityTool {
    fn name(&self) -> &str {
        "refua_affinity"
    }
    fn description(&self) -> &str {
        "estimates target/ligand binding"
    }
    async fn execute(&self, args: Value) -> Result<Value, String> {
        Ok(json!({
            "target": args.get("target").cloned().unwrap_or(Value::Null),
            "smiles": args.get("smiles").cloned().unwrap_or(Value::Null),
            "binding_probability": 0.91,
            "affinity": -8.4,
            "admet": {"admet_score": 0.82, "predictions": {"hERG": 0.1}},
        }))
    }
}

fn registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ValidateSpecTool);
    registry.register(AffinityTool);
    registry
}

#[tokio::test]
async fn approved_plan_executes_and_yields_promising_cures() {
    let plan_text = r#"{"calls":[
        {"tool":"refua_validate_spec","args":{"spec":"kras-g12d binder"}},
        {"tool":"refua_affinity","args":{"target":"KRAS","smiles":"CCN","name":"kras_alpha"}}
    ]}"#;
    let mock = Arc::new(MockOpenClaw::new(
        plan_text,
        r#"{"approved":true,"issues":[],"suggested_fixes":[]}"#,
    ));

    let adapter = RegistryAdapter::new(registry());
    let planner = AutonomousPlanner::new(
        mock.clone(),
        adapter.available_tools(),
        PlanPolicy::default(),
    );
    let result = planner
        .run("Cure KRAS-driven cancers", "Plan with rigor.", 3)
        .await
        .unwrap();

    assert!(result.approved);
    assert_eq!(result.iterations.len(), 1);

    let results = adapter.execute_plan(&result.final_plan).await.unwrap();
    assert_eq!(results.len(), 2);

    let cures = extract_promising_cures(&results, DEFAULT_MIN_SCORE);
    assert_eq!(cures.len(), 1);
    assert!(cures[0].promising);
    assert_eq!(cures[0].tool, "refua_affinity");
    assert_eq!(cures[0].target.as_deref(), Some("KRAS"));
    assert_eq!(cures[0].cure_id, "refua_affinity:kras-alpha");

    let summary = summarize_promising_cures(&cures);
    assert_eq!(summary.total_candidates, 1);
    assert_eq!(summary.promising_count, 1);
    assert_eq!(summary.with_admet_properties, 1);
}

#[tokio::test]
async fn loop_exhausts_rounds_when_critic_never_approves() {
    let mock = Arc::new(MockOpenClaw::new(
        r#"{"calls":[{"tool":"refua_validate_spec","args":{}}]}"#,
        r#"{"approved":false,"issues":["missing negative controls"],"suggested_fixes":["add a decoy target"]}"#,
    ));
    let planner = AutonomousPlanner::new(
        mock.clone(),
        vec!["refua_validate_spec".to_string()],
        PlanPolicy::default(),
    );
    let result = planner
        .run("objective", "prompt", 3)
        .await
        .unwrap();

    assert!(!result.approved);
    assert_eq!(result.iterations.len(), 3);
    // best-effort artifact survives rejection
    assert_eq!(result.final_plan["calls"][0]["tool"], "refua_validate_spec");
    // 3 planner rounds + 3 critic rounds
    assert_eq!(mock.captured().len(), 6);

    // every later round carries the critic's feedback forward
    let later_plan_calls: Vec<_> = mock
        .captured()
        .iter()
        .filter(|c| c.metadata["phase"] == "plan-loop")
        .skip(1)
        .map(|c| c.instructions.clone())
        .collect();
    assert_eq!(later_plan_calls.len(), 2);
    for instructions in later_plan_calls {
        assert!(instructions.contains("missing negative controls"));
        assert!(instructions.contains("add a decoy target"));
    }
}

#[tokio::test]
async fn policy_rejection_feeds_back_and_converges_after_fix() {
    // The policy gate rejects an over-long plan even though the critic approves,
    // so convergence requires both signals.
    let plan_text = r#"{"calls":[
        {"tool":"refua_validate_spec","args":{}},
        {"tool":"refua_affinity","args":{}},
        {"tool":"refua_affinity","args":{}}
    ]}"#;
    let mock = Arc::new(MockOpenClaw::new(
        plan_text,
        r#"{"approved":true,"issues":[],"suggested_fixes":[]}"#,
    ));
    let policy = PlanPolicy {
        max_calls: 2,
        ..PlanPolicy::default()
    };
    let planner = AutonomousPlanner::new(
        mock.clone(),
        vec!["refua_validate_spec".to_string(), "refua_affinity".to_string()],
        policy,
    );
    let result = planner.run("objective", "prompt", 2).await.unwrap();

    assert!(!result.approved);
    assert!(result.iterations[0]
        .policy
        .errors
        .iter()
        .any(|e| e.contains("max_calls=2")));
    // The scripted planner never shrinks the plan, so the loop runs both rounds.
    assert_eq!(result.iterations.len(), 2);
}
