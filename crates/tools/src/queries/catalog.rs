//! Catalog lister: every tracked skill, grouped by category

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use teamskills_core::Result;
use teamskills_store::{self as store, QueryExecutor, decode_all};
use tracing::instrument;

use crate::Tool;
use crate::types::{ToolParameter, ToolResult};

pub const TOOL_NAME: &str = "list_all_skills";

const EMPTY: &str = "No skills found in the database.";

/// Heading for skills without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Deserialize)]
struct CatalogRow {
    skill_name: String,
    category_id: Option<i64>,
    category: Option<String>,
    user_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSkill {
    pub name: String,
    pub user_count: i64,
}

/// A category and its skills; `id` is `None` for the uncategorized group
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogCategory {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub skills: Vec<CatalogSkill>,
}

impl CatalogCategory {
    pub fn heading(&self) -> &str {
        self.name.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub categories: Vec<CatalogCategory>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Group rows by category id, keeping the query's order
    fn from_rows(rows: Vec<CatalogRow>) -> Self {
        let mut categories: Vec<CatalogCategory> = Vec::new();
        let mut index: HashMap<Option<i64>, usize> = HashMap::new();

        for row in rows {
            let slot = *index.entry(row.category_id).or_insert_with(|| {
                categories.push(CatalogCategory { id: row.category_id, name: row.category.clone(), skills: Vec::new() });
                categories.len() - 1
            });
            categories[slot].skills.push(CatalogSkill { name: row.skill_name, user_count: row.user_count });
        }

        Self { categories }
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str(EMPTY);
        }

        let mut lines = vec!["## Available Skills\n".to_string()];
        for category in &self.categories {
            lines.push(format!("### {}", category.heading()));
            for skill in &category.skills {
                lines.push(format!("- {} ({} users)", skill.name, skill.user_count));
            }
            lines.push(String::new());
        }
        f.write_str(&lines.join("\n"))
    }
}

#[derive(Clone)]
pub struct CatalogLister {
    executor: Arc<dyn QueryExecutor>,
}

impl CatalogLister {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// Categories by name with uncategorized last, same-named categories apart by id, skills by name
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> store::Result<Catalog> {
        let sql = "SELECT s.id AS skill_id, s.name AS skill_name, \
                          sc.id AS category_id, sc.name AS category, \
                          COUNT(us.id) AS user_count \
                   FROM skills s \
                   LEFT JOIN skill_categories sc ON s.category_id = sc.id \
                   LEFT JOIN user_skills us ON s.id = us.skill_id \
                   GROUP BY s.id, s.name, sc.id, sc.name \
                   ORDER BY sc.name ASC NULLS LAST, sc.id ASC, s.name ASC, s.id ASC";

        let rows: Vec<CatalogRow> = decode_all(&self.executor.try_fetch_all(sql, &[]).await?)?;
        tracing::debug!("Catalog holds {} skills", rows.len());
        Ok(Catalog::from_rows(rows))
    }

    /// List and render; a failed query reads as an empty catalog
    pub async fn list_skills(&self) -> String {
        match self.catalog().await {
            Ok(catalog) => catalog.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Catalog query failed");
                EMPTY.to_string()
            }
        }
    }
}

/// `list_all_skills` tool
#[derive(Clone)]
pub struct ListSkillsTool {
    lister: CatalogLister,
}

impl ListSkillsTool {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { lister: CatalogLister::new(executor) }
    }
}

impl fmt::Debug for ListSkillsTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSkillsTool").finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for ListSkillsTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "List all tracked skills grouped by category, with how many people hold each."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::empty()
    }

    async fn execute(&self, tool_call_id: String, _arguments: &Value) -> Result<ToolResult> {
        Ok(ToolResult::success(tool_call_id, self.lister.list_skills().await))
    }
}
