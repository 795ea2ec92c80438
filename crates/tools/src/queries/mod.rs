//! The four skill query tools
//!
//! Each module pairs a component that talks to the [`QueryExecutor`] and keeps
//! failures typed, a report type whose `Display` is the text handed to the
//! agent, and the [`Tool`](crate::Tool) wrapper.

mod args;
pub mod catalog;
pub mod experts;
pub mod gaps;
pub mod summary;

use std::sync::Arc;
use teamskills_core::{Result, ToolsConfig};
use teamskills_store::QueryExecutor;

use crate::ToolRegistry;

pub use args::{ArgumentError, FindExpertsArgs};
pub use catalog::{Catalog, CatalogLister, ListSkillsTool};
pub use experts::{Expert, ExpertReport, FindExpertsTool, SkillMatcher};
pub use gaps::{GapAnalyzer, GapBucket, GapReport, SkillCoverage, SkillGapsTool};
pub use summary::{SkillSummaryTool, SummaryReport, SummaryReporter, TeamStats};

/// Names of the query tools, in the order they are offered
pub const TOOL_NAMES: [&str; 4] = [experts::TOOL_NAME, gaps::TOOL_NAME, summary::TOOL_NAME, catalog::TOOL_NAME];

/// Register all four query tools against one executor
pub fn register_all(registry: &ToolRegistry, executor: Arc<dyn QueryExecutor>, config: &ToolsConfig) -> Result<()> {
    registry.register(FindExpertsTool::new(Arc::clone(&executor)))?;
    registry.register(SkillGapsTool::new(Arc::clone(&executor), config))?;
    registry.register(SkillSummaryTool::new(Arc::clone(&executor), config))?;
    registry.register(ListSkillsTool::new(executor))?;
    Ok(())
}

/// A registry holding exactly the query tools
pub fn default_registry(executor: Arc<dyn QueryExecutor>, config: &ToolsConfig) -> Result<ToolRegistry> {
    let registry = ToolRegistry::new();
    register_all(&registry, executor, config)?;
    Ok(registry)
}
