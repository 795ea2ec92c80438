//! Events emitted while tool calls run, and their Server-Sent Events framing

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::{ToolCall, ToolResult};

/// Longest `tool_result` payload carried on the stream, in characters
pub const RESULT_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A tool is about to run
    ToolCall { name: String, args: Value },
    /// A tool finished; `result` is truncated to [`RESULT_PREVIEW_CHARS`]
    ToolResult { name: String, result: String },
    /// Response text
    Content { content: String },
    /// End of stream
    Done,
    Error { content: String },
}

impl StreamEvent {
    pub fn tool_call(call: &ToolCall) -> Self {
        Self::ToolCall { name: call.name().to_string(), args: call.arguments().clone() }
    }

    pub fn tool_result(name: impl Into<String>, result: &ToolResult) -> Self {
        Self::ToolResult { name: name.into(), result: result.text().chars().take(RESULT_PREVIEW_CHARS).collect() }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self::Content { content: content.into() }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::Error { content: content.into() }
    }

    /// The SSE event name, matching the `type` field of the payload
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Content { .. } => "content",
            Self::Done => "done",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }

    /// Render as one SSE frame: `event: <type>\ndata: <json>\n\n`
    pub fn to_sse(&self) -> String {
        let data = serde_json::to_string(self).unwrap_or_else(|e| {
            json!({"type": "error", "content": format!("failed to encode event: {e}")}).to_string()
        });
        format!("event: {}\ndata: {}\n\n", self.event_type(), data)
    }
}
