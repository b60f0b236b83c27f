//! OpenClaw HTTP client
//!
//! POSTs to `{base_url}/v1/responses` with optional bearer auth and a hard
//! request timeout. Any transport failure is fatal to the run: no retries,
//! the upstream status and detail text are surfaced as-is.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::OpenClawSection;
use crate::core::CampaignError;
use crate::openclaw::{OpenClawApi, OpenClawResponse};

/// Concrete client over reqwest. Holds the endpoint config and a pooled HTTP client.
pub struct OpenClawClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    bearer_token: Option<String>,
}

impl OpenClawClient {
    pub fn new(config: &OpenClawSection) -> Result<Self, CampaignError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(config.timeout_secs.max(1.0)))
            .build()
            .map_err(|e| CampaignError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    async fn post_json(&self, path: &str, payload: Value) -> Result<Value, CampaignError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut request = self.http.post(&url).json(&payload);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CampaignError::Transport(format!("Failed to reach OpenClaw at {url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CampaignError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(CampaignError::Transport(format!(
                "OpenClaw API HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: Value = serde_json::from_str(&body)
            .map_err(|_| CampaignError::Transport("OpenClaw API returned non-JSON content.".to_string()))?;
        if !parsed.is_object() {
            return Err(CampaignError::Transport(
                "OpenClaw API returned an unexpected response envelope type.".to_string(),
            ));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl OpenClawApi for OpenClawClient {
    async fn create_response(
        &self,
        user_input: &str,
        instructions: &str,
        metadata: Value,
    ) -> Result<OpenClawResponse, CampaignError> {
        let mut payload = json!({
            "model": self.model,
            "input": user_input,
            "instructions": instructions,
        });
        if !metadata.is_null() {
            payload["metadata"] = metadata;
        }

        let raw = self.post_json("/v1/responses", payload).await?;
        let text = extract_response_text(&raw);
        Ok(OpenClawResponse { raw, text })
    }
}

/// Pull plain text out of a response envelope.
///
/// Prefers a non-empty `output_text`, then concatenates text fragments found in
/// `output[]` items and their nested `content[]`, and finally falls back to a
/// JSON dump of the whole envelope.
pub fn extract_response_text(payload: &Value) -> String {
    if let Some(direct) = payload.get("output_text").and_then(Value::as_str) {
        let trimmed = direct.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut chunks: Vec<String> = Vec::new();
    if let Some(output) = payload.get("output").and_then(Value::as_array) {
        for item in output {
            if let Some(text) = item.get("text").and_then(Value::as_str) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            }
            if let Some(content) = item.get("content").and_then(Value::as_array) {
                for piece in content {
                    if let Some(text) = piece.get("text").and_then(Value::as_str) {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            chunks.push(trimmed.to_string());
                        }
                    }
                }
            }
        }
    }
    if !chunks.is_empty() {
        return chunks.join("\n");
    }

    payload.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_output_text() {
        let payload = json!({"output_text": "hello world"});
        assert_eq!(extract_response_text(&payload), "hello world");
    }

    #[test]
    fn reads_nested_content() {
        let payload = json!({
            "output": [
                {"content": [{"text": "{\"calls\":[]}"}]}
            ]
        });
        assert_eq!(extract_response_text(&payload), "{\"calls\":[]}");
    }

    #[test]
    fn joins_item_and_content_fragments() {
        let payload = json!({
            "output": [
                {"text": "first", "content": [{"text": "second"}]},
                {"text": "third"}
            ]
        });
        assert_eq!(extract_response_text(&payload), "first\nsecond\nthird");
    }

    #[test]
    fn falls_back_to_envelope_dump() {
        let payload = json!({"id": "resp_1"});
        assert_eq!(extract_response_text(&payload), payload.to_string());
    }
}
