use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use teamskills_core::{Error, Result};

use crate::Tool;
use crate::types::{ToolResult, ToolSpec};

/// Registry that holds all available tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    /// Creates a new empty tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new tool in the registry
    ///
    /// Returns error if a tool with the same name already exists
    pub fn register<T: Tool + 'static>(&self, tool: T) -> Result<()> {
        let name = tool.name().to_string();
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);

        if tools.contains_key(&name) {
            return Err(Error::Validation(format!("Tool '{}' already registered", name)));
        }

        tracing::debug!(tool = %name, "Registered tool");
        tools.insert(name, Arc::new(tool));
        Ok(())
    }

    /// Gets a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).get(name).cloned()
    }

    /// Checks if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).contains_key(name)
    }

    /// Returns names of all registered tools, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns all tool specs, sorted by name
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> =
            self.tools.read().unwrap_or_else(PoisonError::into_inner).values().map(|tool| tool.spec()).collect();
        specs.sort_by(|a, b| a.name().cmp(b.name()));
        specs
    }

    /// Returns the number of registered tools
    pub fn count(&self) -> usize {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Executes a tool by name with given arguments
    ///
    /// The registry lock is released before the tool runs.
    pub async fn execute(
        &self, tool_name: &str, tool_call_id: String, arguments: &serde_json::Value,
    ) -> Result<ToolResult> {
        match self.get(tool_name) {
            Some(tool) => tool.execute(tool_call_id, arguments).await,
            None => Err(Error::Tool(format!("Tool '{}' not found in registry", tool_name))),
        }
    }
}
