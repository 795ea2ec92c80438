//! Logging setup on top of the tracing ecosystem.
//!
//! # Environment Variables
//!
//! - `TEAMSKILLS_LOG`: Filter directive (like `RUST_LOG`), e.g., `teamskills_store=debug`
//! - `TEAMSKILLS_LOG_FORMAT`: Output format for stderr: `pretty`, `json`, `compact`
//! - `TEAMSKILLS_LOG_DIR`: Directory for the rolling log file (default `~/.teamskills/logs`)
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! level = "warn"
//! format = "pretty"
//!
//! [logging.file]
//! enabled = false
//! level = "debug"
//! max_files = 5
//!
//! [logging.privacy]
//! log_tool_args = true
//! log_tool_output = "truncate"
//! truncate_length = 500
//! ```

use crate::Error;
use crate::config::{FileLoggingConfig, LoggingConfig as ConfigLoggingConfig};
use std::env;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Pretty, human-readable output with colors (default for TTY)
    #[default]
    Pretty,
    /// JSON output (one line per event)
    Json,
    /// Compact, single-line output
    Compact,
}

impl LogFormat {
    /// All available log formats.
    pub const VALUES: &[LogFormat] = &[LogFormat::Pretty, LogFormat::Json, LogFormat::Compact];

    /// Parse a log format from a string.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

/// How to log tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolOutputLogging {
    /// Don't log tool output.
    #[default]
    None,
    /// Log truncated output (up to `truncate_length` chars).
    Truncate,
    /// Log full output.
    Full,
}

impl ToolOutputLogging {
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(ToolOutputLogging::None),
            "truncate" => Some(ToolOutputLogging::Truncate),
            "full" => Some(ToolOutputLogging::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolOutputLogging::None => "none",
            ToolOutputLogging::Truncate => "truncate",
            ToolOutputLogging::Full => "full",
        }
    }
}

impl FromStr for ToolOutputLogging {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolOutputLogging::parse_str(s).ok_or_else(|| format!("invalid tool output logging: {}", s))
    }
}

/// Privacy configuration for tool content in logs.
#[derive(Debug, Clone, Default)]
pub struct PrivacyConfig {
    /// Include tool arguments in logs.
    pub log_tool_args: bool,
    /// How to handle tool output in logs.
    pub log_tool_output: ToolOutputLogging,
    /// Maximum length for truncated content.
    pub truncate_length: usize,
}

impl PrivacyConfig {
    /// Render tool output for a log line, or `None` when output logging is off.
    pub fn render_output(&self, content: &str) -> Option<String> {
        match self.log_tool_output {
            ToolOutputLogging::None => None,
            _ => Some(redact_sensitive(content, self)),
        }
    }
}

/// Logging configuration wrapper that bridges config and logging modules.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log level for stderr output.
    pub level: String,
    /// Output format for stderr.
    pub format: LogFormat,
    /// File logging configuration (optional).
    pub file: Option<FileLoggingConfig>,
    pub privacy: PrivacyConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: LogFormat::default(), file: None, privacy: PrivacyConfig::default() }
    }
}

impl From<ConfigLoggingConfig> for LoggingConfig {
    fn from(config: ConfigLoggingConfig) -> Self {
        let format = LogFormat::parse_str(&config.format).unwrap_or_default();
        let log_tool_output = ToolOutputLogging::parse_str(&config.privacy.log_tool_output).unwrap_or_default();

        Self {
            level: config.level,
            format,
            file: if config.file.enabled { Some(config.file) } else { None },
            privacy: PrivacyConfig {
                log_tool_args: config.privacy.log_tool_args,
                log_tool_output,
                truncate_length: config.privacy.truncate_length,
            },
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file_logging(mut self, config: FileLoggingConfig) -> Self {
        self.file = Some(config);
        self
    }

    pub fn with_privacy(mut self, config: PrivacyConfig) -> Self {
        self.privacy = config;
        self
    }

    /// Filter precedence: `TEAMSKILLS_LOG`, then `RUST_LOG`, then the configured level.
    fn filter_directive(&self) -> String {
        env::var("TEAMSKILLS_LOG")
            .ok()
            .or_else(|| env::var("RUST_LOG").ok())
            .unwrap_or_else(|| self.level.clone())
    }

    fn is_tty() -> bool {
        atty::is(atty::Stream::Stderr)
    }

    /// Determine the appropriate format for stderr output.
    fn detect_format(&self) -> LogFormat {
        if let Ok(fmt_str) = env::var("TEAMSKILLS_LOG_FORMAT")
            && let Some(fmt) = LogFormat::parse_str(&fmt_str)
        {
            return fmt;
        }

        if self.format == LogFormat::Pretty && !Self::is_tty() { LogFormat::Compact } else { self.format }
    }

    fn get_log_dir() -> Result<PathBuf, Error> {
        if let Ok(custom_dir) = env::var("TEAMSKILLS_LOG_DIR") {
            return Ok(PathBuf::from(custom_dir));
        }

        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;

        Ok(PathBuf::from(home).join(".teamskills").join("logs"))
    }
}

fn stderr_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    match format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(io::stderr).with_ansi(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(io::stderr).boxed(),
    }
}

/// Initialize the global tracing subscriber.
///
/// Stderr output honours the configured level and format. When file logging is
/// enabled a daily-rolling JSON log is written as well; the returned guard must
/// be held for the lifetime of the process so buffered lines get flushed.
pub fn init_logging(config: Option<LoggingConfig>) -> Result<Option<WorkerGuard>, Error> {
    let config = config.unwrap_or_default();
    let format = config.detect_format();
    let stderr_filter = EnvFilter::try_new(config.filter_directive())
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))?;

    let stderr = stderr_layer(format).with_filter(stderr_filter);

    let Some(file_config) = &config.file else {
        Registry::default()
            .with(stderr)
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to install subscriber: {}", e)))?;
        return Ok(None);
    };

    let log_dir = LoggingConfig::get_log_dir()?;
    std::fs::create_dir_all(&log_dir).map_err(|e| Error::Config(format!("Failed to create log directory: {}", e)))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("teamskills")
        .filename_suffix("log")
        .max_log_files(file_config.max_files.max(1))
        .build(&log_dir)
        .map_err(|e| Error::Config(format!("Failed to create log file appender: {}", e)))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = EnvFilter::try_new(&file_config.level)
        .map_err(|e| Error::Config(format!("Invalid file log filter: {}", e)))?;

    Registry::default()
        .with(stderr)
        .with(fmt::layer().json().with_writer(non_blocking).with_filter(file_filter))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install subscriber: {}", e)))?;

    Ok(Some(guard))
}

/// Redact sensitive content from a string based on privacy settings.
pub fn redact_sensitive(content: &str, privacy: &PrivacyConfig) -> String {
    if content.chars().count() <= privacy.truncate_length {
        return content.to_string();
    }

    match privacy.log_tool_output {
        ToolOutputLogging::None => "[REDACTED]".to_string(),
        ToolOutputLogging::Truncate => {
            let mut truncated = content.chars().take(privacy.truncate_length).collect::<String>();
            truncated.push_str("...");
            truncated.push_str(&format!(" ({} total chars)", content.chars().count()));
            truncated
        }
        ToolOutputLogging::Full => content.to_string(),
    }
}
