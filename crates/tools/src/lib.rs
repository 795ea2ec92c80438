//! Tool surface of the team skills service
//!
//! Exposes the skill queries as named tools an agent can call with JSON
//! arguments, plus the registry, dispatcher and event stream that run them.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use teamskills_store::Database;
//! use teamskills_tools::{ToolCall, ToolDispatcher, queries};
//!
//! let db = Arc::new(Database::new(&config.database));
//! db.connect().await?;
//! let registry = queries::default_registry(db, &config.tools)?;
//! let dispatcher = ToolDispatcher::new(registry);
//!
//! let call = ToolCall::new("call_1", "find_experts_by_skills", json!({"skills": ["Rust"]}));
//! println!("{}", dispatcher.execute(&call).await?.content);
//! ```

pub mod dispatcher;
pub mod queries;
pub mod registry;
pub mod stream;
pub mod tool;
pub mod types;

#[cfg(test)]
mod test_helpers;

pub use dispatcher::{AgentStatus, CANCELLED, ToolDispatcher};
pub use queries::{TOOL_NAMES, default_registry, register_all};
pub use registry::ToolRegistry;
pub use stream::{RESULT_PREVIEW_CHARS, StreamEvent};
pub use tool::Tool;
pub use types::{FunctionCall, FunctionSpec, ToolCall, ToolParameter, ToolResult, ToolSpec};
