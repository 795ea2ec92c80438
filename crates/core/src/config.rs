use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Environment variable overriding `[database].path`
pub const DATABASE_ENV: &str = "TEAMSKILLS_DATABASE";

/// Largest connection pool the store will open
pub const MAX_POOL_SIZE: usize = 10;

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Number of pooled read-only connections (1..=10)
    pub pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("teamskills.db"), pool_size: 4 }
    }
}

/// Result-size limits for the query tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ToolsConfig {
    /// How many of the worst-covered skills the gap analysis considers
    pub gap_candidate_limit: usize,
    /// Entries shown per gap bucket
    pub gap_display_limit: usize,
    /// Entries in the "most common skills" list
    pub top_skills_limit: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self { gap_candidate_limit: 20, gap_display_limit: 10, top_skills_limit: 5 }
    }
}

/// File logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub level: String,
    /// Rotated daily files to keep
    pub max_files: usize,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self { enabled: false, level: "debug".to_string(), max_files: 5 }
    }
}

/// Privacy controls for tool arguments and output in logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PrivacyLoggingConfig {
    pub log_tool_args: bool,
    /// `none`, `truncate` or `full`
    pub log_tool_output: String,
    pub truncate_length: usize,
}

impl Default for PrivacyLoggingConfig {
    fn default() -> Self {
        Self { log_tool_args: true, log_tool_output: "truncate".to_string(), truncate_length: 500 }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty`, `json` or `compact`
    pub format: String,
    pub file: FileLoggingConfig,
    pub privacy: PrivacyLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
            file: FileLoggingConfig::default(),
            privacy: PrivacyLoggingConfig::default(),
        }
    }
}

/// Root configuration structure for teamskills.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str).map_err(|e| ConfigError::from(e).into_error())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    ///
    /// Environment overrides are applied in both cases.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() { Self::from_file(path)? } else { Self::default() };
        Ok(config.with_env_overrides())
    }

    /// Apply `TEAMSKILLS_DATABASE` when set and non-empty
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var(DATABASE_ENV)
            && !path.trim().is_empty()
        {
            self.database.path = PathBuf::from(path);
        }
        self
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 || self.database.pool_size > MAX_POOL_SIZE {
            return Err(ConfigError::InvalidPoolSize(self.database.pool_size).into_error());
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingDatabasePath.into_error());
        }

        for (name, value) in [
            ("gap_candidate_limit", self.tools.gap_candidate_limit),
            ("gap_display_limit", self.tools.gap_display_limit),
            ("top_skills_limit", self.tools.top_skills_limit),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroLimit(name.to_string()).into_error());
            }
        }

        Ok(())
    }

    /// Get example configuration (as a string)
    pub fn example() -> &'static str {
        r#"# Team skills query service configuration

[database]
# SQLite database file (override with TEAMSKILLS_DATABASE)
path = "teamskills.db"
# Read-only connections kept open (1-10)
pool_size = 4

[tools]
# Worst-covered skills considered by the gap analysis
gap_candidate_limit = 20
# Entries shown per gap section
gap_display_limit = 10
# Entries in the most common skills list
top_skills_limit = 5

[logging]
# Filter directive; TEAMSKILLS_LOG or RUST_LOG take precedence
level = "warn"
# "pretty", "json" or "compact"
format = "pretty"

[logging.file]
enabled = false
level = "debug"
max_files = 5

[logging.privacy]
log_tool_args = true
# "none", "truncate" or "full"
log_tool_output = "truncate"
truncate_length = 500
"#
    }
}

/// Configuration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("pool_size must be between 1 and 10, got {0}")]
    InvalidPoolSize(usize),

    #[error("database path must not be empty")]
    MissingDatabasePath,

    #[error("{0} must be greater than zero")]
    ZeroLimit(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

impl ConfigError {
    fn into_error(self) -> crate::Error {
        crate::Error::Config(self.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlParse(err.to_string())
    }
}
