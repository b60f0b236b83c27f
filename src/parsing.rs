//! Two-stage JSON recovery from planner/critic text
//!
//! LLM output frequently wraps the machine payload in prose or markdown fences.
//! Stage one is a strict parse of the trimmed text; stage two retries on the
//! substring between the first `{` and the last `}`. The stages are separate
//! functions so each acceptance rule is testable on its own.

use serde_json::Value;

use crate::core::CampaignError;

/// Strict parse, then brace-substring fallback. Accepts only JSON objects.
pub fn parse_json_object(text: &str) -> Result<Value, CampaignError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CampaignError::StructuralPlan(
            "Planner returned empty output.".to_string(),
        ));
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return require_object(value);
    }
    first_json_object(trimmed)
}

/// Stage two on its own: parse the substring between the first `{` and the last `}`.
pub fn first_json_object(text: &str) -> Result<Value, CampaignError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) if e > s => (s, e),
        _ => {
            return Err(CampaignError::StructuralPlan(
                "Output did not contain a JSON object.".to_string(),
            ))
        }
    };
    let snippet = &text[start..=end];
    let value: Value = serde_json::from_str(snippet)
        .map_err(|e| CampaignError::StructuralPlan(format!("Invalid JSON payload: {e}")))?;
    require_object(value)
}

/// Parse planner text into a plan: a JSON object carrying a `calls` array.
pub fn extract_json_plan(text: &str) -> Result<Value, CampaignError> {
    let parsed = parse_json_object(text)?;
    match parsed.get("calls") {
        Some(Value::Array(_)) => Ok(parsed),
        _ => Err(CampaignError::StructuralPlan(
            "Planner output must contain a 'calls' list.".to_string(),
        )),
    }
}

fn require_object(value: Value) -> Result<Value, CampaignError> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(CampaignError::StructuralPlan(
            "Extracted JSON payload is not an object.".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_from_plain_json() {
        let plan =
            extract_json_plan(r#"{"calls":[{"tool":"refua_validate_spec","args":{}}]}"#).unwrap();
        assert_eq!(plan["calls"][0]["tool"], "refua_validate_spec");
    }

    #[test]
    fn plan_from_wrapped_text() {
        let text = "Plan follows:\n```json\n{\"calls\":[{\"tool\":\"refua_job\",\"args\":{\"job_id\":\"abc\"}}]}\n```";
        let plan = extract_json_plan(text).unwrap();
        assert_eq!(plan["calls"][0]["args"]["job_id"], "abc");
    }

    #[test]
    fn plan_requires_calls_list() {
        assert!(extract_json_plan(r#"{"steps":[]}"#).is_err());
        assert!(extract_json_plan(r#"{"calls":{}}"#).is_err());
    }

    #[test]
    fn empty_output_is_rejected() {
        assert!(parse_json_object("   ").is_err());
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(parse_json_object("[1,2,3]").is_err());
    }

    #[test]
    fn brace_substring_stage_is_independent() {
        let value = first_json_object("noise {\"a\":1} trailing").unwrap();
        assert_eq!(value["a"], 1);
        assert!(first_json_object("no braces here").is_err());
    }
}
