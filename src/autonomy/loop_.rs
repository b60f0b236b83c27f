//! Autonomous plan convergence loop
//!
//! Plan -> policy gate -> critique -> feedback -> re-plan, bounded by the round
//! budget. The critic always runs, even on a policy-rejected plan, because both
//! signals feed the next round's feedback. Responder failures and unparseable
//! planner/critic output are fatal to the whole run; the caller keeps whatever
//! iteration history was produced before the failure only on clean termination.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::autonomy::critic::{parse_critic_json, CriticVerdict};
use crate::autonomy::feedback::build_feedback;
use crate::autonomy::policy::{evaluate_plan_policy, PlanPolicy, PolicyCheck};
use crate::core::CampaignError;
use crate::openclaw::OpenClawApi;
use crate::parsing::extract_json_plan;
use crate::prompts::planner_suffix;

/// One fixed campaign phase the planner must cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionMilestone {
    pub phase: String,
    pub goal: String,
}

/// Fixed five-phase mission arc, independent of the concrete objective.
pub fn build_mission_milestones() -> Vec<MissionMilestone> {
    let phases = [
        (
            "portfolio",
            "prioritize disease programs by burden, tractability, and unmet need",
        ),
        (
            "targeting",
            "generate validated target hypotheses and assay strategies",
        ),
        (
            "design",
            "produce structure-grounded candidate molecules or biologics",
        ),
        (
            "screening",
            "score candidates on binding, confidence, and safety signals",
        ),
        (
            "translation",
            "package reproducible evidence and regulatory-ready rationale",
        ),
    ];
    phases
        .iter()
        .map(|(phase, goal)| MissionMilestone {
            phase: phase.to_string(),
            goal: goal.to_string(),
        })
        .collect()
}

/// Everything recorded for one round. Immutable once appended to the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutonomyIteration {
    pub round_index: usize,
    pub planner_text: String,
    pub plan: Value,
    pub policy: PolicyCheck,
    pub critic_text: String,
    pub critic: CriticVerdict,
}

/// Full loop outcome. `final_plan` is always the latest plan produced, so the
/// caller has a best-effort artifact even without approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutonomousPlanResult {
    pub objective: String,
    pub system_prompt: String,
    pub iterations: Vec<AutonomyIteration>,
    pub final_plan: Value,
    pub approved: bool,
}

/// Drives planner/critic rounds against OpenClaw until convergence or exhaustion.
pub struct AutonomousPlanner {
    openclaw: Arc<dyn OpenClawApi>,
    available_tools: Vec<String>,
    policy: PlanPolicy,
}

impl AutonomousPlanner {
    pub fn new(openclaw: Arc<dyn OpenClawApi>, available_tools: Vec<String>, policy: PlanPolicy) -> Self {
        let mut available_tools = available_tools;
        available_tools.sort();
        Self {
            openclaw,
            available_tools,
            policy,
        }
    }

    pub async fn run(
        &self,
        objective: &str,
        system_prompt: &str,
        max_rounds: usize,
    ) -> Result<AutonomousPlanResult, CampaignError> {
        let mut iterations: Vec<AutonomyIteration> = Vec::new();
        let mut feedback: Vec<String> = Vec::new();
        let mut final_plan = json!({ "calls": [] });
        let mut approved = false;

        for round_index in 1..=max_rounds.max(1) {
            let (planner_text, plan) = self.plan_once(objective, system_prompt, &feedback).await?;
            let policy_check = evaluate_plan_policy(&plan, &self.available_tools, &self.policy);
            let (critic_text, critic) = self.critic_once(objective, &plan, &policy_check).await?;

            tracing::info!(
                round = round_index,
                policy_approved = policy_check.approved,
                critic_approved = critic.approved,
                errors = policy_check.errors.len(),
                "autonomy round"
            );

            final_plan = plan.clone();
            let policy_approved = policy_check.approved;
            let critic_approved = critic.approved;
            let new_feedback = build_feedback(&policy_check, &critic);
            iterations.push(AutonomyIteration {
                round_index,
                planner_text,
                plan,
                policy: policy_check,
                critic_text,
                critic,
            });

            if policy_approved && critic_approved {
                approved = true;
                break;
            }
            if new_feedback.is_empty() {
                // Nothing new to act on: replanning would loop on identical input.
                break;
            }
            feedback = new_feedback;
        }

        Ok(AutonomousPlanResult {
            objective: objective.to_string(),
            system_prompt: system_prompt.to_string(),
            iterations,
            final_plan,
            approved,
        })
    }

    async fn plan_once(
        &self,
        objective: &str,
        system_prompt: &str,
        feedback: &[String],
    ) -> Result<(String, Value), CampaignError> {
        let milestones = serde_json::to_string_pretty(&build_mission_milestones())?;
        let feedback_block = if feedback.is_empty() {
            String::new()
        } else {
            format!("\n\nPrevious issues to fix:\n- {}", feedback.join("\n- "))
        };

        let instructions = format!(
            "{}\n\nMission milestones (must be represented in your actions):\n{}\n\n{}{}",
            system_prompt.trim(),
            milestones,
            planner_suffix(&self.available_tools),
            feedback_block
        );

        let response = self
            .openclaw
            .create_response(
                objective,
                &instructions,
                json!({ "component": "ClawCures", "phase": "plan-loop" }),
            )
            .await?;
        let plan = extract_json_plan(&response.text)?;
        Ok((response.text, plan))
    }

    async fn critic_once(
        &self,
        objective: &str,
        plan: &Value,
        policy_check: &PolicyCheck,
    ) -> Result<(String, CriticVerdict), CampaignError> {
        let review_target = json!({
            "objective": objective,
            "plan": plan,
            "policy": {
                "approved": policy_check.approved,
                "errors": policy_check.errors,
                "warnings": policy_check.warnings,
            },
            "required_output": {
                "approved": "boolean",
                "issues": ["string"],
                "suggested_fixes": ["string"],
            },
        });
        let critic_payload = serde_json::to_string(&review_target)?;

        let response = self
            .openclaw
            .create_response(
                &format!(
                    "Critique this plan for scientific rigor, safety, and mission fit.\n\
                     Use this exact JSON payload as the review target:\n{critic_payload}"
                ),
                "Return JSON only with shape \
                 {\"approved\":bool,\"issues\":[...],\"suggested_fixes\":[...]}. \
                 Reject plans that are vague, unsafe, or non-executable.",
                json!({ "component": "ClawCures", "phase": "critic-loop" }),
            )
            .await?;

        let verdict = parse_critic_json(&response.text)?;
        Ok((response.text, verdict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openclaw::MockOpenClaw;

    #[tokio::test]
    async fn converges_in_one_round_when_both_approve() {
        let mock = Arc::new(MockOpenClaw::new(
            r#"{"calls":[{"tool":"refua_validate_spec","args":{}}]}"#,
            r#"{"approved":true,"issues":[],"suggested_fixes":[]}"#,
        ));
        let planner = AutonomousPlanner::new(
            mock.clone(),
            vec!["refua_validate_spec".to_string()],
            PlanPolicy::default(),
        );
        let result = planner
            .run("Assess target safety", "Return strict JSON plans.", 3)
            .await
            .unwrap();

        assert!(result.approved);
        assert_eq!(result.iterations.len(), 1);
        assert_eq!(result.final_plan["calls"][0]["tool"], "refua_validate_spec");
        // one planner call + one critic call
        assert_eq!(mock.captured().len(), 2);
    }

    #[tokio::test]
    async fn non_boolean_critic_approved_blocks_convergence() {
        let mock = Arc::new(MockOpenClaw::new(
            r#"{"calls":[{"tool":"refua_validate_spec","args":{}}]}"#,
            r#"{"approved":"false","issues":["unsafe"],"suggested_fixes":[]}"#,
        ));
        let planner = AutonomousPlanner::new(
            mock,
            vec!["refua_validate_spec".to_string()],
            PlanPolicy::default(),
        );
        let result = planner
            .run("Assess target safety", "Return strict JSON plans.", 1)
            .await
            .unwrap();

        assert!(!result.approved);
        assert!(!result.iterations[0].critic.approved);
        assert_eq!(result.iterations[0].critic.issues, vec!["unsafe"]);
    }

    #[tokio::test]
    async fn critic_review_target_embeds_plan_and_policy() {
        let mock = Arc::new(MockOpenClaw::new(
            r#"{"calls":[{"tool":"refua_validate_spec","args":{"name":"demo"}}]}"#,
            r#"{"approved":true,"issues":[],"suggested_fixes":[]}"#,
        ));
        let planner = AutonomousPlanner::new(
            mock.clone(),
            vec!["refua_validate_spec".to_string()],
            PlanPolicy::default(),
        );
        planner
            .run("Assess KRAS candidate quality", "prompt", 1)
            .await
            .unwrap();

        let calls = mock.captured();
        let critic_call = calls
            .iter()
            .find(|c| c.metadata["phase"] == "critic-loop")
            .unwrap();
        assert_eq!(critic_call.metadata["component"], "ClawCures");
        assert!(critic_call.user_input.contains("Assess KRAS candidate quality"));
        assert!(critic_call.user_input.contains("refua_validate_spec"));
        assert!(critic_call.user_input.contains("\"name\":\"demo\""));
    }

    #[tokio::test]
    async fn feedback_appears_in_second_round_instructions() {
        let mock = Arc::new(MockOpenClaw::new(
            r#"{"calls":[{"tool":"refua_fold","args":{}}]}"#,
            r#"{"approved":false,"issues":["add controls"],"suggested_fixes":[]}"#,
        ));
        let planner = AutonomousPlanner::new(
            mock.clone(),
            vec!["refua_validate_spec".to_string(), "refua_fold".to_string()],
            PlanPolicy::default(),
        );
        let result = planner.run("objective", "prompt", 2).await.unwrap();
        assert!(!result.approved);
        assert_eq!(result.iterations.len(), 2);

        let calls = mock.captured();
        let second_plan_call = calls
            .iter()
            .filter(|c| c.metadata["phase"] == "plan-loop")
            .nth(1)
            .unwrap();
        assert!(second_plan_call.instructions.contains("Previous issues to fix:"));
        assert!(second_plan_call.instructions.contains("add controls"));
        // Policy warning about validate-first is carried too.
        assert!(second_plan_call
            .instructions
            .contains("First call is not refua_validate_spec"));
    }

    #[tokio::test]
    async fn halts_after_one_round_when_feedback_is_empty() {
        // Policy passes with no warnings, critic rejects without naming issues:
        // there is nothing to feed the next round, so the loop stops early.
        let mock = Arc::new(MockOpenClaw::new(
            r#"{"calls":[{"tool":"refua_validate_spec","args":{}}]}"#,
            r#"{"approved":false,"issues":[],"suggested_fixes":[]}"#,
        ));
        let planner = AutonomousPlanner::new(
            mock.clone(),
            vec!["refua_validate_spec".to_string()],
            PlanPolicy::default(),
        );
        let result = planner.run("objective", "prompt", 5).await.unwrap();

        assert!(!result.approved);
        assert_eq!(result.iterations.len(), 1);
        assert_eq!(mock.captured().len(), 2);
    }

    #[tokio::test]
    async fn unparseable_plan_is_fatal() {
        let mock = Arc::new(MockOpenClaw::new(
            "no json at all",
            r#"{"approved":true,"issues":[],"suggested_fixes":[]}"#,
        ));
        let planner = AutonomousPlanner::new(mock, vec![], PlanPolicy::default());
        let err = planner.run("objective", "prompt", 2).await.unwrap_err();
        assert!(matches!(err, CampaignError::StructuralPlan(_)));
    }
}
