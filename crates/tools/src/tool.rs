use async_trait::async_trait;
use serde_json::Value;
use teamskills_core::Result;

use crate::types::{ToolParameter, ToolResult, ToolSpec};

/// The core trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync + std::fmt::Debug {
    /// Returns the unique name of this tool
    fn name(&self) -> &str;

    /// Returns a description of what this tool does
    fn description(&self) -> &str;

    /// Returns the parameter schema for this tool
    fn parameters(&self) -> ToolParameter;

    /// Executes the tool with the given arguments
    ///
    /// Bad arguments come back as an error [ToolResult]; `Err` is reserved for
    /// failures outside the tool's control.
    async fn execute(&self, tool_call_id: String, arguments: &Value) -> Result<ToolResult>;

    /// Returns the full [ToolSpec] for this tool
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name(), self.description(), self.parameters())
    }
}
