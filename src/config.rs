//! Application configuration, loaded from config/default.toml and environment
//! variables.
//!
//! Load order: the TOML file first, then `CLAWCURES__*` environment overrides
//! (double underscore marks nesting, e.g. `CLAWCURES__OPENCLAW__MODEL=...`).
//! Legacy single-purpose token variables are honored for the bearer token.

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::CampaignError;

/// Configuration root (top level of config/default.toml).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub openclaw: OpenClawSection,
    #[serde(default)]
    pub policy: PolicySection,
    #[serde(default)]
    pub extraction: ExtractionSection,
}

/// [openclaw] section: gateway endpoint, model routing, timeout, auth.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenClawSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    pub bearer_token: Option<String>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:18789".to_string()
}

fn default_model() -> String {
    "openclaw:main".to_string()
}

fn default_timeout_secs() -> f64 {
    180.0
}

impl Default for OpenClawSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            bearer_token: None,
        }
    }
}

/// [policy] section: plan-gate defaults, overridable per run from the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicySection {
    #[serde(default = "default_max_calls")]
    pub max_calls: usize,
    #[serde(default = "default_require_validate_first")]
    pub require_validate_first: bool,
}

fn default_max_calls() -> usize {
    10
}

fn default_require_validate_first() -> bool {
    true
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            max_calls: default_max_calls(),
            require_validate_first: default_require_validate_first(),
        }
    }
}

/// [extraction] section: promising-cure classification threshold.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSection {
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

fn default_min_score() -> f64 {
    55.0
}

impl Default for ExtractionSection {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
        }
    }
}

/// Load configuration, `CLAWCURES__*` environment variables override the file.
///
/// 1. The first existing file among config/default.toml, ../config/default.toml,
///    default.toml is taken as the base source.
/// 2. An explicit `config_path`, when given and present, is layered on top.
/// 3. Environment variables are applied last.
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, CampaignError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{name}.toml");
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CLAWCURES")
            .separator("__")
            .try_parsing(true),
    );

    let built = builder
        .build()
        .map_err(|e| CampaignError::Config(e.to_string()))?;
    let mut app: AppConfig = built
        .try_deserialize()
        .map_err(|e| CampaignError::Config(e.to_string()))?;

    if app.openclaw.bearer_token.is_none() {
        app.openclaw.bearer_token = bearer_token_from_env();
    }
    app.openclaw.timeout_secs = app.openclaw.timeout_secs.max(1.0);
    Ok(app)
}

/// Gateway token fallbacks, checked in priority order.
fn bearer_token_from_env() -> Option<String> {
    ["OPENCLAW_GATEWAY_TOKEN", "OPENCLAW_GATEWAY_PASSWORD"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
