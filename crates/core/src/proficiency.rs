//! The four-level proficiency scale used by every skill query.
//!
//! Stored assignments carry a level code (`L100`..`L400`). Codes outside that
//! set are kept verbatim as [`ProficiencyLevel::Unrecognized`]: they display as
//! written and never take part in ranked comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Ordinal skill rating
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProficiencyLevel {
    /// Beginner
    L100,
    /// Intermediate
    #[default]
    L200,
    /// Practitioner
    L300,
    /// Expert
    L400,
    /// Any other stored code
    Unrecognized(String),
}

impl ProficiencyLevel {
    /// The recognized levels in ascending rank order.
    pub const RANKED: &[ProficiencyLevel] =
        &[ProficiencyLevel::L100, ProficiencyLevel::L200, ProficiencyLevel::L300, ProficiencyLevel::L400];

    /// Lowest level counted as holding real expertise in gap analysis.
    pub const EXPERT_THRESHOLD: ProficiencyLevel = ProficiencyLevel::L300;

    /// Interpret a stored level code. Never fails.
    pub fn from_code(code: &str) -> Self {
        match code {
            "L100" => Self::L100,
            "L200" => Self::L200,
            "L300" => Self::L300,
            "L400" => Self::L400,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Look up the level with the given rank (1..=4).
    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            1 => Some(Self::L100),
            2 => Some(Self::L200),
            3 => Some(Self::L300),
            4 => Some(Self::L400),
            _ => None,
        }
    }

    /// Integer rank 1..=4, or `None` for unrecognized codes.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::L100 => Some(1),
            Self::L200 => Some(2),
            Self::L300 => Some(3),
            Self::L400 => Some(4),
            Self::Unrecognized(_) => None,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::L100 => "L100",
            Self::L200 => "L200",
            Self::L300 => "L300",
            Self::L400 => "L400",
            Self::Unrecognized(code) => code,
        }
    }

    /// Human label; unrecognized codes pass through unchanged.
    pub fn label(&self) -> &str {
        match self {
            Self::L100 => "Beginner",
            Self::L200 => "Intermediate",
            Self::L300 => "Practitioner",
            Self::L400 => "Expert",
            Self::Unrecognized(code) => code,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.rank().is_some()
    }

    /// True when this level ranks at or above `min`.
    ///
    /// Unrecognized levels never qualify, and an unrecognized minimum admits nothing.
    pub fn meets(&self, min: &ProficiencyLevel) -> bool {
        match (self.rank(), min.rank()) {
            (Some(rank), Some(min_rank)) => rank >= min_rank,
            _ => false,
        }
    }

    /// SQL `CASE` expression mapping a level column to its rank (NULL when unrecognized).
    pub fn rank_case_sql(column: &str) -> String {
        let arms: Vec<String> = Self::RANKED
            .iter()
            .filter_map(|level| level.rank().map(|rank| format!("WHEN '{}' THEN {}", level.code(), rank)))
            .collect();
        format!("CASE {} {} END", column, arms.join(" "))
    }

    /// Label for an average rank: `<1.5` Beginner, `<2.5` Intermediate, `<3.5` Practitioner, else Expert.
    pub fn label_for_mean(mean: Option<f64>) -> &'static str {
        match mean {
            None => "N/A",
            Some(m) if m.is_nan() || m <= 0.0 => "N/A",
            Some(m) if m < 1.5 => "Beginner",
            Some(m) if m < 2.5 => "Intermediate",
            Some(m) if m < 3.5 => "Practitioner",
            Some(_) => "Expert",
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for ProficiencyLevel {
    fn from(code: String) -> Self {
        match Self::from_code(&code) {
            Self::Unrecognized(_) => Self::Unrecognized(code),
            level => level,
        }
    }
}

impl From<ProficiencyLevel> for String {
    fn from(level: ProficiencyLevel) -> Self {
        match level {
            ProficiencyLevel::Unrecognized(code) => code,
            level => level.code().to_string(),
        }
    }
}

/// Strict parse for user input: accepts `L100`..`L400` in any case.
impl FromStr for ProficiencyLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_code(&s.trim().to_uppercase()) {
            Self::Unrecognized(_) => Err(Error::Validation(format!(
                "invalid proficiency level '{}': expected one of L100, L200, L300, L400",
                s
            ))),
            level => Ok(level),
        }
    }
}
