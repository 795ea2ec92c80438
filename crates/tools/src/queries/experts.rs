//! Skill matcher: who knows these skills, at or above a minimum level

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use teamskills_core::{ProficiencyLevel, Result};
use teamskills_store::{self as store, Param, QueryExecutor, UNICODE_LOWER, decode_all};
use tracing::instrument;

use super::args::FindExpertsArgs;
use crate::Tool;
use crate::types::{ToolParameter, ToolResult};

pub const TOOL_NAME: &str = "find_experts_by_skills";

const NO_SKILLS: &str = "No skills specified. Please provide at least one skill to search for.";

/// One matching assignment, as returned by the query
#[derive(Debug, Clone, Deserialize)]
struct ExpertRow {
    user_id: i64,
    user_name: String,
    role: Option<String>,
    team: Option<String>,
    skill_name: String,
    proficiency_level: ProficiencyLevel,
    category: Option<String>,
}

/// A skill held by a matched person
#[derive(Debug, Clone, PartialEq)]
pub struct SkillMatch {
    pub skill: String,
    pub level: ProficiencyLevel,
    pub category: Option<String>,
}

/// A matched person and every qualifying skill they hold
#[derive(Debug, Clone, PartialEq)]
pub struct Expert {
    pub user_id: i64,
    pub name: String,
    pub role: Option<String>,
    pub team: Option<String>,
    pub skills: Vec<SkillMatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpertReport {
    /// No usable search terms were given
    NoSkills,
    /// Nothing matched
    NoMatches { terms: Vec<String>, min_proficiency: ProficiencyLevel },
    /// People in best-match-first order
    Found(Vec<Expert>),
}

impl fmt::Display for ExpertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSkills => f.write_str(NO_SKILLS),
            Self::NoMatches { terms, min_proficiency } => write!(
                f,
                "No team members found with skills matching: {} (minimum {})",
                terms.join(", "),
                min_proficiency
            ),
            Self::Found(experts) => {
                let mut lines = vec![format!("Found {} team member(s) with matching skills:\n", experts.len())];
                for expert in experts {
                    lines.push(format!(
                        "**{}** ({}, {})",
                        expert.name,
                        expert.role.as_deref().unwrap_or("No role"),
                        expert.team.as_deref().unwrap_or("No team")
                    ));
                    for skill in &expert.skills {
                        lines.push(format!("  - {}: {} ({})", skill.skill, skill.level, skill.level.label()));
                    }
                    lines.push(String::new());
                }
                f.write_str(&lines.join("\n"))
            }
        }
    }
}

/// Finds people by skill name
#[derive(Clone)]
pub struct SkillMatcher {
    executor: Arc<dyn QueryExecutor>,
}

impl SkillMatcher {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// Search, keeping query failures as `Err`
    ///
    /// Terms match case-insensitively anywhere in the skill name. Blank terms
    /// are ignored; with none left no query runs.
    #[instrument(skip(self, skills), fields(terms = skills.len(), min = %min_proficiency))]
    pub async fn search(&self, skills: &[String], min_proficiency: &ProficiencyLevel) -> store::Result<ExpertReport> {
        let terms = search_terms(skills);
        if terms.is_empty() {
            tracing::debug!("No search terms, skipping query");
            return Ok(ExpertReport::NoSkills);
        }

        let min_rank = match min_proficiency.rank() {
            Some(rank) => rank,
            None => {
                tracing::warn!(min = %min_proficiency, "Unrecognized minimum level, using L200");
                ProficiencyLevel::default().rank().unwrap_or(2)
            }
        };
        let effective_min = ProficiencyLevel::from_rank(min_rank).unwrap_or_default();

        let (sql, params) = experts_query(&terms, min_rank);
        let rows: Vec<ExpertRow> = decode_all(&self.executor.try_fetch_all(&sql, &params).await?)?;
        tracing::info!("Query returned {} matching assignments", rows.len());

        if rows.is_empty() {
            return Ok(ExpertReport::NoMatches { terms, min_proficiency: effective_min });
        }
        Ok(ExpertReport::Found(group_by_user(rows)))
    }

    /// Search and render; a failed query reads the same as no matches
    pub async fn find_experts(&self, skills: &[String], min_proficiency: &ProficiencyLevel) -> String {
        match self.search(skills, min_proficiency).await {
            Ok(report) => report.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Expert search failed");
                let terms = search_terms(skills);
                let min_proficiency =
                    if min_proficiency.is_recognized() { min_proficiency.clone() } else { ProficiencyLevel::default() };
                ExpertReport::NoMatches { terms, min_proficiency }.to_string()
            }
        }
    }
}

fn search_terms(skills: &[String]) -> Vec<String> {
    skills.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Group rows per user id, keeping first-appearance order
fn group_by_user(rows: Vec<ExpertRow>) -> Vec<Expert> {
    let mut experts: Vec<Expert> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let slot = *index.entry(row.user_id).or_insert_with(|| {
            experts.push(Expert {
                user_id: row.user_id,
                name: row.user_name.clone(),
                role: row.role.clone(),
                team: row.team.clone(),
                skills: Vec::new(),
            });
            experts.len() - 1
        });
        experts[slot].skills.push(SkillMatch {
            skill: row.skill_name,
            level: row.proficiency_level,
            category: row.category,
        });
    }

    experts
}

/// `%term%` with LIKE wildcards escaped by `\`, folded the same way as `UNICODE_LOWER`
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn experts_query(terms: &[String], min_rank: u8) -> (String, Vec<Param>) {
    let rank = ProficiencyLevel::rank_case_sql("us.proficiency_level");
    let matches: Vec<String> =
        (0..terms.len()).map(|i| format!(r"{UNICODE_LOWER}(s.name) LIKE ?{} ESCAPE '\'", i + 2)).collect();

    let sql = format!(
        "SELECT u.id AS user_id, u.name AS user_name, u.role, u.team, \
                s.name AS skill_name, us.proficiency_level, sc.name AS category \
         FROM user_skills us \
         JOIN users u ON us.user_id = u.id \
         JOIN skills s ON us.skill_id = s.id \
         LEFT JOIN skill_categories sc ON s.category_id = sc.id \
         WHERE {rank} >= ?1 AND ({}) \
         ORDER BY {rank} DESC, u.name COLLATE BINARY ASC, u.id ASC, s.name ASC",
        matches.join(" OR ")
    );

    let mut params = Vec::with_capacity(terms.len() + 1);
    params.push(Param::from(min_rank));
    params.extend(terms.iter().map(|term| Param::from(like_pattern(term))));
    (sql, params)
}

/// `find_experts_by_skills` tool
#[derive(Clone)]
pub struct FindExpertsTool {
    matcher: SkillMatcher,
}

impl FindExpertsTool {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { matcher: SkillMatcher::new(executor) }
    }
}

impl fmt::Debug for FindExpertsTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindExpertsTool").finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FindExpertsTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Find team members who have expertise in the specified skills. Skill names match \
         case-insensitively and partially. Results list each person with their matching \
         skills, strongest first."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![
            (
                "skills".to_string(),
                ToolParameter::new_array(ToolParameter::new_string("A skill name or fragment"))
                    .with_description("Skill names to search for"),
            ),
            (
                "min_proficiency".to_string(),
                ToolParameter::new_string("Minimum proficiency level")
                    .with_allowed(&["L100", "L200", "L300", "L400"])
                    .with_default("L200"),
            ),
        ])
        .with_required(&["skills"])
    }

    async fn execute(&self, tool_call_id: String, arguments: &Value) -> Result<ToolResult> {
        let args = match FindExpertsArgs::from_value(arguments) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected {} arguments", TOOL_NAME);
                return Ok(ToolResult::error(tool_call_id, format!("Invalid arguments: {e}")));
            }
        };

        let text = self.matcher.find_experts(&args.skills, &args.min_proficiency).await;
        Ok(ToolResult::success(tool_call_id, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedExecutor;
    use serde_json::json;
    use teamskills_store::Record;

    fn row(user_id: i64, name: &str, skill: &str, level: &str) -> Record {
        Record::new()
            .with("user_id", user_id)
            .with("user_name", name)
            .with("role", Value::Null)
            .with("team", "Platform")
            .with("skill_name", skill)
            .with("proficiency_level", level)
            .with("category", "Cloud")
    }

    fn terms(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_skills_issue_no_query() {
        let executor = Arc::new(ScriptedExecutor::new());
        let matcher = SkillMatcher::new(executor.clone());

        let text = matcher.find_experts(&[], &ProficiencyLevel::L200).await;
        assert_eq!(text, NO_SKILLS);
        let text = matcher.find_experts(&terms(&["  ", ""]), &ProficiencyLevel::L200).await;
        assert_eq!(text, NO_SKILLS);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_matches_names_terms_and_minimum() {
        let executor = Arc::new(ScriptedExecutor::new().returning(vec![]));
        let matcher = SkillMatcher::new(executor);

        let text = matcher.find_experts(&terms(&["Rust", "Go"]), &ProficiencyLevel::L300).await;
        assert_eq!(text, "No team members found with skills matching: Rust, Go (minimum L300)");
    }

    #[tokio::test]
    async fn test_query_failure_reads_as_no_matches() {
        let executor = Arc::new(ScriptedExecutor::new().failing());
        let matcher = SkillMatcher::new(executor.clone());

        assert!(matcher.search(&terms(&["Rust"]), &ProficiencyLevel::L200).await.is_err());

        let executor = Arc::new(ScriptedExecutor::new().failing());
        let matcher = SkillMatcher::new(executor);
        let text = matcher.find_experts(&terms(&["Rust"]), &ProficiencyLevel::L200).await;
        assert_eq!(text, "No team members found with skills matching: Rust (minimum L200)");
    }

    #[tokio::test]
    async fn test_groups_by_user_id_in_row_order() {
        let rows = vec![
            row(1, "Alice", "Kubernetes", "L400"),
            row(2, "Alice", "Kubernetes", "L300"),
            row(1, "Alice", "Kubernetes Operators", "L300"),
        ];
        let executor = Arc::new(ScriptedExecutor::new().returning(rows));
        let matcher = SkillMatcher::new(executor);

        let ExpertReport::Found(experts) =
            matcher.search(&terms(&["kube"]), &ProficiencyLevel::L200).await.unwrap()
        else {
            panic!("expected matches");
        };
        assert_eq!(experts.len(), 2);
        assert_eq!(experts[0].user_id, 1);
        assert_eq!(experts[0].skills.len(), 2);
        assert_eq!(experts[1].user_id, 2);
        assert_eq!(experts[1].name, "Alice");
    }

    #[tokio::test]
    async fn test_rendering() {
        let executor = Arc::new(ScriptedExecutor::new().returning(vec![
            row(1, "Alice", "Kubernetes", "L400"),
            row(2, "Bob", "Kubernetes", "L300"),
        ]));
        let matcher = SkillMatcher::new(executor);

        let text = matcher.find_experts(&terms(&["Kubernetes"]), &ProficiencyLevel::L200).await;
        assert_eq!(
            text,
            "Found 2 team member(s) with matching skills:\n\n\
             **Alice** (No role, Platform)\n  - Kubernetes: L400 (Expert)\n\n\
             **Bob** (No role, Platform)\n  - Kubernetes: L300 (Practitioner)\n"
        );
    }

    #[tokio::test]
    async fn test_query_shape() {
        let executor = Arc::new(ScriptedExecutor::new().returning(vec![]));
        let matcher = SkillMatcher::new(executor.clone());
        matcher.search(&terms(&[" Rust ", "c_sharp", "100%"]), &ProficiencyLevel::L300).await.unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        let (sql, params) = &calls[0];
        assert!(sql.contains("LIKE ?4 ESCAPE"));
        assert_eq!(
            params,
            &vec![
                Param::Integer(3),
                Param::from("%rust%"),
                Param::from(r"%c\_sharp%"),
                Param::from(r"%100\%%"),
            ]
        );
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("Go"), "%go%");
        assert_eq!(like_pattern("Élixir"), "%élixir%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[tokio::test]
    async fn test_tool_rejects_bad_arguments() {
        let tool = FindExpertsTool::new(Arc::new(ScriptedExecutor::new()));
        let result = tool.execute("c1".into(), &json!({"skills": "Rust"})).await.unwrap();
        assert!(result.is_error());

        let result = tool.execute("c2".into(), &json!({"skills": ["Rust"], "min_proficiency": "L9"})).await.unwrap();
        assert!(result.is_error());
        assert!(result.text().contains("invalid proficiency level"));
    }

    #[tokio::test]
    async fn test_tool_missing_skills_is_empty() {
        let tool = FindExpertsTool::new(Arc::new(ScriptedExecutor::new()));
        let result = tool.execute("c1".into(), &json!({})).await.unwrap();
        assert!(result.is_success());
        assert_eq!(result.content, NO_SKILLS);
    }
}
