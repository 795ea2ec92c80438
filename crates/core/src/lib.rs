//! Shared building blocks for the team skills query service: the proficiency
//! scale, configuration, logging setup and the common error type.

pub mod config;
pub mod error;
pub mod logging;
pub mod proficiency;

pub use config::{Config, DatabaseConfig, LoggingConfig as LoggingSection, ToolsConfig};
pub use error::{Error, Result};
pub use logging::{LogFormat, LoggingConfig, PrivacyConfig, ToolOutputLogging, init_logging};
pub use proficiency::ProficiencyLevel;
