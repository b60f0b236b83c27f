//! ClawCures - therapeutic discovery campaign orchestration.
//!
//! Plans drug discovery campaigns through an OpenClaw-compatible gateway,
//! gates the plans with policy and critic review, executes them against the
//! refua tool suite, and mines the execution payloads for promising cure
//! candidates.

pub mod autonomy;
pub mod cli;
pub mod config;
pub mod core;
pub mod cures;
pub mod openclaw;
pub mod orchestrator;
pub mod parsing;
pub mod portfolio;
pub mod prompts;
pub mod tools;
pub mod trials;

pub use crate::core::CampaignError;
