//! Campaign error types
//!
//! Policy findings are never errors: they travel as PolicyCheck data and feed the
//! feedback loop. Everything here is fatal to the operation that raised it.

use thiserror::Error;

/// Errors raised while planning, critiquing, or executing a campaign.
#[derive(Error, Debug)]
pub enum CampaignError {
    /// Planner output was not a usable plan (missing/non-array `calls`, malformed call entry).
    #[error("Structural plan error: {0}")]
    StructuralPlan(String),

    /// Critic output could not be parsed into a JSON object.
    #[error("Critic parse error: {0}")]
    CriticParse(String),

    /// A plan call named a tool outside the discovered tool set.
    #[error("Unsupported tool: {0}")]
    UnsupportedTool(String),

    /// OpenClaw unreachable, non-2xx, or non-JSON envelope.
    #[error("OpenClaw transport error: {0}")]
    Transport(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Trial store error: {0}")]
    TrialStore(String),
}

impl From<std::io::Error> for CampaignError {
    fn from(err: std::io::Error) -> Self {
        CampaignError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CampaignError {
    fn from(err: serde_json::Error) -> Self {
        CampaignError::Json(err.to_string())
    }
}
