//! Gap analyzer: skills nobody is strong in, and skills only one person knows

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

pub const TOOL_NAME: &str = "get_team_skill_gaps";

const NO_DATA: &str = "Unable to analyze skill gaps - no skills data available.";

/// Coverage figures for one skill
#[derive(Debug, Clone, PartialEq)]
pub struct SkillCoverage {
    pub skill_id: i64,
    pub skill: String,
    pub category: Option<String>,
    /// Distinct people with any rating
    pub total_users: i64,
    /// Distinct people at L300 or above
    pub expert_count: i64,
    /// Best recognized level held, if any
    pub highest_level: Option<ProficiencyLevel>,
}

#[derive(Debug, Deserialize)]
struct CoverageRow {
    skill_id: i64,
    skill_name: String,
    category: Option<String>,
    total_users: i64,
    expert_count: i64,
    highest_rank: Option<i64>,
}

impl From<CoverageRow> for SkillCoverage {
    fn from(row: CoverageRow) -> Self {
        Self {
            skill_id: row.skill_id,
            skill: row.skill_name,
            category: row.category,
            total_users: row.total_users,
            expert_count: row.expert_count,
            highest_level: row.highest_rank.and_then(|r| u8::try_from(r).ok()).and_then(ProficiencyLevel::from_rank),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapBucket {
    NoExperts,
    LowCoverage,
}

impl SkillCoverage {
    /// No-experts takes priority over low coverage
    pub fn bucket(&self) -> Option<GapBucket> {
        if self.expert_count == 0 {
            Some(GapBucket::NoExperts)
        } else if self.total_users < 2 {
            Some(GapBucket::LowCoverage)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GapReport {
    /// The query produced no rows, or failed
    NoData,
    Analysis { no_experts: Vec<SkillCoverage>, low_coverage: Vec<SkillCoverage>, display_limit: usize },
}

impl GapReport {
    fn from_coverage(skills: Vec<SkillCoverage>, display_limit: usize) -> Self {
        if skills.is_empty() {
            return Self::NoData;
        }

        let mut no_experts = Vec::new();
        let mut low_coverage = Vec::new();
        for skill in skills {
            match skill.bucket() {
                Some(GapBucket::NoExperts) => no_experts.push(skill),
                Some(GapBucket::LowCoverage) => low_coverage.push(skill),
                None => {}
            }
        }
        Self::Analysis { no_experts, low_coverage, display_limit }
    }
}

impl fmt::Display for GapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Analysis { no_experts, low_coverage, display_limit } = self else {
            return f.write_str(NO_DATA);
        };

        let mut lines = vec!["## Team Skill Gap Analysis\n".to_string()];

        if !no_experts.is_empty() {
            lines.push("### Skills with No Experts (L300+)".to_string());
            lines.push("These skills have no team members at practitioner or expert level:\n".to_string());
            for skill in no_experts.iter().take(*display_limit) {
                lines.push(format!(
                    "- **{}** ({}): {} user(s), highest: {}",
                    skill.skill,
                    skill.category.as_deref().unwrap_or("Uncategorized"),
                    skill.total_users,
                    skill.highest_level.as_ref().map(ProficiencyLevel::code).unwrap_or("None")
                ));
            }
            lines.push(String::new());
        }

        if !low_coverage.is_empty() {
            lines.push("### Skills with Low Coverage".to_string());
            lines.push("These skills have only 1 person with knowledge:\n".to_string());
            for skill in low_coverage.iter().take(*display_limit) {
                lines.push(format!(
                    "- **{}** ({}): Single point of knowledge",
                    skill.skill,
                    skill.category.as_deref().unwrap_or("Uncategorized")
                ));
            }
            lines.push(String::new());
        }

        if no_experts.is_empty() && low_coverage.is_empty() {
            lines.push("Good news! The team has reasonable coverage across all tracked skills.".to_string());
        }

        f.write_str(&lines.join("\n"))
    }
}

/// Finds the worst-covered skills
#[derive(Clone)]
pub struct GapAnalyzer {
    executor: Arc<dyn QueryExecutor>,
    candidate_limit: usize,
    display_limit: usize,
}

impl GapAnalyzer {
    pub fn new(executor: Arc<dyn QueryExecutor>, config: &ToolsConfig) -> Self {
        Self { executor, candidate_limit: config.gap_candidate_limit, display_limit: config.gap_display_limit }
    }

    /// Coverage of the worst-covered skills: fewest experts first, then fewest users, then name
    #[instrument(skip(self), fields(limit = self.candidate_limit))]
    pub async fn coverage(&self) -> store::Result<Vec<SkillCoverage>> {
        let rank = ProficiencyLevel::rank_case_sql("us.proficiency_level");
        let sql = format!(
            "SELECT s.id AS skill_id, s.name AS skill_name, sc.name AS category, \
                    COUNT(DISTINCT us.user_id) AS total_users, \
                    COUNT(DISTINCT CASE WHEN {rank} >= ?1 THEN us.user_id END) AS expert_count, \
                    MAX({rank}) AS highest_rank \
             FROM skills s \
             LEFT JOIN skill_categories sc ON s.category_id = sc.id \
             LEFT JOIN user_skills us ON s.id = us.skill_id \
             GROUP BY s.id, s.name, sc.name \
             ORDER BY expert_count ASC, total_users ASC, s.name ASC, s.id ASC \
             LIMIT ?2"
        );
        let threshold = ProficiencyLevel::EXPERT_THRESHOLD.rank().unwrap_or(3);
        let params = [Param::from(threshold), Param::from(self.candidate_limit)];

        let rows: Vec<CoverageRow> = decode_all(&self.executor.try_fetch_all(&sql, &params).await?)?;
        tracing::debug!("Coverage computed for {} skills", rows.len());
        Ok(rows.into_iter().map(SkillCoverage::from).collect())
    }

    pub async fn report(&self) -> store::Result<GapReport> {
        Ok(GapReport::from_coverage(self.coverage().await?, self.display_limit))
    }

    /// Analyze and render; a failed query reads the same as an empty store
    pub async fn analyze_gaps(&self) -> String {
        match self.report().await {
            Ok(report) => report.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Gap analysis failed");
                GapReport::NoData.to_string()
            }
        }
    }
}

/// `get_team_skill_gaps` tool
#[derive(Clone)]
pub struct SkillGapsTool {
    analyzer: GapAnalyzer,
}

impl SkillGapsTool {
    pub fn new(executor: Arc<dyn QueryExecutor>, config: &ToolsConfig) -> Self {
        Self { analyzer: GapAnalyzer::new(executor, config) }
    }
}

impl fmt::Debug for SkillGapsTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillGapsTool")
            .field("candidate_limit", &self.analyzer.candidate_limit)
            .field("display_limit", &self.analyzer.display_limit)
            .finish()
    }
}

#[async_trait]
impl Tool for SkillGapsTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Identify skills that have low coverage or no experts (L300+) on the team."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::empty()
    }

    async fn execute(&self, tool_call_id: String, _arguments: &Value) -> Result<ToolResult> {
        Ok(ToolResult::success(tool_call_id, self.analyzer.analyze_gaps().await))
    }
}
