//! OpenClaw client abstraction
//!
//! The planner and critic both go through this seam, so tests can script
//! responses per phase without a gateway running.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::CampaignError;

/// One response from the OpenClaw `/v1/responses` endpoint.
#[derive(Debug, Clone)]
pub struct OpenClawResponse {
    /// Full response envelope as returned by the gateway.
    pub raw: Value,
    /// Extracted plain text (see `extract_response_text`).
    pub text: String,
}

/// OpenClaw responder: turn an input + instructions pair into text.
#[async_trait]
pub trait OpenClawApi: Send + Sync {
    async fn create_response(
        &self,
        user_input: &str,
        instructions: &str,
        metadata: Value,
    ) -> Result<OpenClawResponse, CampaignError>;
}
