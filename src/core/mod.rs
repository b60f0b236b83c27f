//! Core: error taxonomy shared by every component.

pub mod error;

pub use error::CampaignError;
