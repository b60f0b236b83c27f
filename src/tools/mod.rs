//! Tools: registry of campaign capabilities and plan-execution adapters.

pub mod adapter;
pub mod registry;

pub use adapter::{ExecutionResult, RegistryAdapter, StaticToolAdapter, ToolAdapter, DEFAULT_TOOL_LIST};
pub use registry::{Tool, ToolRegistry};
