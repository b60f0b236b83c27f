//! Mock OpenClaw client (for tests, no gateway needed)
//!
//! Scripted per metadata `phase`: the planner asks with phase `plan-loop`, the
//! critic with `critic-loop`. Every call is recorded for assertion.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::CampaignError;
use crate::openclaw::{OpenClawApi, OpenClawResponse};

/// One recorded `create_response` invocation.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub user_input: String,
    pub instructions: String,
    pub metadata: Value,
}

/// Scripted client: fixed text per phase, shared across rounds.
#[derive(Debug, Default)]
pub struct MockOpenClaw {
    plan_text: String,
    critic_text: String,
    pub calls: Mutex<Vec<CapturedCall>>,
}

impl MockOpenClaw {
    pub fn new(plan_text: impl Into<String>, critic_text: impl Into<String>) -> Self {
        Self {
            plan_text: plan_text.into(),
            critic_text: critic_text.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn captured(&self) -> Vec<CapturedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OpenClawApi for MockOpenClaw {
    async fn create_response(
        &self,
        user_input: &str,
        instructions: &str,
        metadata: Value,
    ) -> Result<OpenClawResponse, CampaignError> {
        self.calls.lock().unwrap().push(CapturedCall {
            user_input: user_input.to_string(),
            instructions: instructions.to_string(),
            metadata: metadata.clone(),
        });

        let phase = metadata.get("phase").and_then(Value::as_str).unwrap_or("");
        let text = match phase {
            "critic-loop" => self.critic_text.clone(),
            _ => self.plan_text.clone(),
        };
        Ok(OpenClawResponse {
            raw: json!({ "output_text": text }),
            text,
        })
    }
}
