//! Summary reporter: team-wide counts and the most common skills

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use teamskills_core::{ProficiencyLevel, Result, ToolsConfig};
use teamskills_store::{self as store, Param, QueryExecutor, decode_all};
use tracing::instrument;

use crate::Tool;
use crate::types::{ToolParameter, ToolResult};

pub const TOOL_NAME: &str = "get_skill_summary";

const UNAVAILABLE: &str = "Unable to retrieve team skill summary.";

/// Aggregate figures for the whole team
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamStats {
    pub total_users: i64,
    pub total_skills: i64,
    pub total_categories: i64,
    pub total_user_skills: i64,
    /// Mean rank over recognized assignments
    pub avg_proficiency: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopularSkill {
    pub name: String,
    pub user_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryReport {
    Unavailable,
    Summary { stats: TeamStats, top_skills: Vec<PopularSkill> },
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Summary { stats, top_skills } = self else {
            return f.write_str(UNAVAILABLE);
        };

        let mut lines = vec![
            "## Team Skills Summary\n".to_string(),
            format!("- **Team Members:** {}", stats.total_users),
            format!("- **Skills Tracked:** {}", stats.total_skills),
            format!("- **Skill Categories:** {}", stats.total_categories),
            format!("- **Total Skill Assignments:** {}", stats.total_user_skills),
            format!("- **Average Proficiency:** {}", ProficiencyLevel::label_for_mean(stats.avg_proficiency)),
            String::new(),
        ];

        if !top_skills.is_empty() {
            lines.push("### Most Common Skills".to_string());
            for skill in top_skills {
                lines.push(format!("- {}: {} team member(s)", skill.name, skill.user_count));
            }
        }

        f.write_str(&lines.join("\n"))
    }
}

#[derive(Clone)]
pub struct SummaryReporter {
    executor: Arc<dyn QueryExecutor>,
    top_limit: usize,
}

impl SummaryReporter {
    pub fn new(executor: Arc<dyn QueryExecutor>, config: &ToolsConfig) -> Self {
        Self { executor, top_limit: config.top_skills_limit }
    }

    /// Counts over users × skills with their assignments; `None` when no aggregate row comes back
    #[instrument(skip(self))]
    pub async fn stats(&self) -> store::Result<Option<TeamStats>> {
        let rank = ProficiencyLevel::rank_case_sql("us.proficiency_level");
        let sql = format!(
            "SELECT COUNT(DISTINCT u.id) AS total_users, \
                    COUNT(DISTINCT s.id) AS total_skills, \
                    COUNT(DISTINCT sc.id) AS total_categories, \
                    COUNT(us.id) AS total_user_skills, \
                    AVG({rank}) AS avg_proficiency \
             FROM users u \
             CROSS JOIN skills s \
             LEFT JOIN skill_categories sc ON s.category_id = sc.id \
             LEFT JOIN user_skills us ON u.id = us.user_id AND s.id = us.skill_id"
        );

        self.executor.try_fetch_one(&sql, &[]).await?.map(|row| row.decode()).transpose()
    }

    /// Skills with the most assignments, ties by name
    #[instrument(skip(self), fields(limit = self.top_limit))]
    pub async fn top_skills(&self) -> store::Result<Vec<PopularSkill>> {
        let sql = "SELECT s.name, COUNT(us.id) AS user_count \
                   FROM skills s \
                   JOIN user_skills us ON s.id = us.skill_id \
                   GROUP BY s.id, s.name \
                   ORDER BY user_count DESC, s.name ASC \
                   LIMIT ?1";
        decode_all(&self.executor.try_fetch_all(sql, &[Param::from(self.top_limit)]).await?)
    }

    /// A failing top-skills query leaves that section out
    pub async fn report(&self) -> store::Result<SummaryReport> {
        let Some(stats) = self.stats().await? else {
            return Ok(SummaryReport::Unavailable);
        };

        let top_skills = match self.top_skills().await {
            Ok(skills) => skills,
            Err(e) => {
                tracing::warn!(error = %e, "Top skills query failed, omitting section");
                Vec::new()
            }
        };

        Ok(SummaryReport::Summary { stats, top_skills })
    }

    /// Summarize and render; a failed query reads as unavailable
    pub async fn get_summary(&self) -> String {
        match self.report().await {
            Ok(report) => report.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Summary query failed");
                SummaryReport::Unavailable.to_string()
            }
        }
    }
}

/// `get_skill_summary` tool
#[derive(Clone)]
pub struct SkillSummaryTool {
    reporter: SummaryReporter,
}

impl SkillSummaryTool {
    pub fn new(executor: Arc<dyn QueryExecutor>, config: &ToolsConfig) -> Self {
        Self { reporter: SummaryReporter::new(executor, config) }
    }
}

impl fmt::Debug for SkillSummaryTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillSummaryTool").field("top_limit", &self.reporter.top_limit).finish()
    }
}

#[async_trait]
impl Tool for SkillSummaryTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Get a high-level summary of team skills: head count, tracked skills, categories, \
         average proficiency and the most common skills."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::empty()
    }

    async fn execute(&self, tool_call_id: String, _arguments: &Value) -> Result<ToolResult> {
        Ok(ToolResult::success(tool_call_id, self.reporter.get_summary().await))
    }
}
