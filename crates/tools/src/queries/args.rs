//! Argument decoding for the query tools

use serde_json::Value;
use teamskills_core::ProficiencyLevel;
use thiserror::Error;

/// Why a tool call's arguments were rejected
#[derive(Debug, Error, PartialEq)]
pub enum ArgumentError {
    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("'{0}' must be an array of strings")]
    NotStringArray(&'static str),

    #[error("'{0}' must be a string")]
    NotString(&'static str),

    #[error("{0}")]
    InvalidLevel(String),
}

/// Arguments of `find_experts_by_skills`
#[derive(Debug, Clone, PartialEq)]
pub struct FindExpertsArgs {
    pub skills: Vec<String>,
    pub min_proficiency: ProficiencyLevel,
}

impl FindExpertsArgs {
    /// Decode from a tool call payload
    ///
    /// `null` or a missing `skills` key means no skills; a missing
    /// `min_proficiency` means L200.
    pub fn from_value(arguments: &Value) -> Result<Self, ArgumentError> {
        let fields = match arguments {
            Value::Null => return Ok(Self { skills: Vec::new(), min_proficiency: ProficiencyLevel::default() }),
            Value::Object(fields) => fields,
            _ => return Err(ArgumentError::NotAnObject),
        };

        let skills = match fields.get("skills") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or(ArgumentError::NotStringArray("skills")))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(ArgumentError::NotStringArray("skills")),
        };

        let min_proficiency = match fields.get("min_proficiency") {
            None | Some(Value::Null) => ProficiencyLevel::default(),
            Some(Value::String(code)) => {
                code.parse().map_err(|e: teamskills_core::Error| ArgumentError::InvalidLevel(e.to_string()))?
            }
            Some(_) => return Err(ArgumentError::NotString("min_proficiency")),
        };

        Ok(Self { skills, min_proficiency })
    }
}
