//! Tool registry
//!
//! Every capability implements the Tool trait (name / description / execute)
//! and is registered once at startup. Plan execution resolves names against
//! this registry instead of dispatching dynamically per call.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// A campaign capability. Tools take JSON args and report a structured JSON
/// payload that the evidence extraction engine can mine.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name used in a plan's `tool` field.
    fn name(&self) -> &str;

    /// Short description for tool manifests.
    fn description(&self) -> &str;

    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Name-keyed store of tools, built once at startup.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}
