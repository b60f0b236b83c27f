//! Critic verdict parsing
//!
//! The critic must answer with `{"approved":bool,"issues":[...],"suggested_fixes":[...]}`.
//! Parsing is defensive: a non-boolean `approved` is coerced to false and
//! non-list issue fields become empty lists, so a malformed critique can never
//! silently read as approval. A non-object response is fatal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::CampaignError;
use crate::parsing::parse_json_object;

/// Normalized critic review of one plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticVerdict {
    pub approved: bool,
    pub issues: Vec<String>,
    pub suggested_fixes: Vec<String>,
}

/// Parse critic text with the two-stage JSON recovery, then normalize fields.
pub fn parse_critic_json(text: &str) -> Result<CriticVerdict, CampaignError> {
    let payload = parse_json_object(text)
        .map_err(|_| CampaignError::CriticParse("Critic output must be a JSON object.".to_string()))?;

    let approved = matches!(payload.get("approved"), Some(Value::Bool(true)));
    Ok(CriticVerdict {
        approved,
        issues: string_list(payload.get("issues")),
        suggested_fixes: string_list(payload.get("suggested_fixes")),
    })
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let text = match item {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            };
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        })
        .collect()
}
