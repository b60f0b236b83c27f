//! Plan policy gate
//!
//! Pure validation of a proposed plan against structural rules and the
//! configured call budget. Errors block approval; warnings never do. Both are
//! surfaced to the feedback loop.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool that should open every plan so cheap validation runs before expensive calls.
pub const VALIDATE_FIRST_TOOL: &str = "refua_validate_spec";

/// Static policy knobs for plan validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPolicy {
    pub max_calls: usize,
    pub require_validate_first: bool,
    /// Tool expected in first position when `require_validate_first` is set.
    #[serde(default = "default_validate_tool")]
    pub validate_tool: String,
}

fn default_validate_tool() -> String {
    VALIDATE_FIRST_TOOL.to_string()
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            max_calls: 10,
            require_validate_first: true,
            validate_tool: default_validate_tool(),
        }
    }
}

/// Outcome of one policy evaluation. `approved` holds exactly when `errors` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyCheck {
    pub approved: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl PolicyCheck {
    fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            approved: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Validate a raw plan value. Deterministic and side-effect free: malformed
/// input always yields a report, never a panic or an error.
pub fn evaluate_plan_policy(plan: &Value, allowed_tools: &[String], policy: &PlanPolicy) -> PolicyCheck {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let calls = match plan.get("calls").and_then(Value::as_array) {
        Some(calls) => calls,
        None => {
            return PolicyCheck::from_findings(
                vec!["Plan must contain a 'calls' list.".to_string()],
                Vec::new(),
            );
        }
    };

    if calls.is_empty() {
        errors.push("Plan has no tool calls.".to_string());
    }

    if calls.len() > policy.max_calls {
        errors.push(format!(
            "Plan has {} calls, exceeding policy max_calls={}.",
            calls.len(),
            policy.max_calls
        ));
    }

    for (idx, entry) in calls.iter().enumerate() {
        let ordinal = idx + 1;
        let entry = match entry.as_object() {
            Some(entry) => entry,
            None => {
                errors.push(format!("Call #{ordinal} is not an object."));
                continue;
            }
        };
        let tool = match entry.get("tool").and_then(Value::as_str) {
            Some(tool) if !tool.is_empty() => tool,
            _ => {
                errors.push(format!("Call #{ordinal} has invalid tool name."));
                continue;
            }
        };
        if !allowed_tools.iter().any(|name| name == tool) {
            errors.push(format!("Call #{ordinal} uses unsupported tool '{tool}'."));
        }
        if let Some(args) = entry.get("args") {
            if !args.is_object() {
                errors.push(format!("Call #{ordinal} args must be an object."));
            }
        }
    }

    if policy.require_validate_first && !calls.is_empty() {
        let first_tool = calls[0].get("tool").and_then(Value::as_str);
        if first_tool != Some(policy.validate_tool.as_str()) {
            warnings.push(format!(
                "First call is not {}; high-cost calls may fail later.",
                policy.validate_tool
            ));
        }
    }

    PolicyCheck::from_findings(errors, warnings)
}
