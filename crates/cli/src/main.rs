use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use teamskills_core::{Config, LoggingConfig, ProficiencyLevel, init_logging};
use teamskills_store::{Database, QueryExecutor, bootstrap};
use teamskills_tools::queries::{catalog, experts, gaps, summary};
use teamskills_tools::{StreamEvent, ToolCall, ToolDispatcher, ToolResult, default_registry};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// teamskills - ask who knows what on your team
#[derive(Parser, Debug)]
#[command(name = "teamskills")]
#[command(about = "Query team skills, experts and gaps from a SQLite skills database", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to teamskills.toml (default: ./teamskills.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Database file, overriding the config and TEAMSKILLS_DATABASE
    #[arg(short, long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database schema and an example config
    Init,
    /// Show configuration and database status
    Status,
    /// Print the tool definitions as JSON
    Tools,
    /// Find people holding any of the given skills
    Experts {
        /// Skill names or fragments, matched case-insensitively
        #[arg(required = true, value_name = "SKILL")]
        skills: Vec<String>,

        /// Minimum proficiency level (L100-L400)
        #[arg(short, long, value_name = "LEVEL", default_value = "L200", value_parser = parse_level)]
        min: ProficiencyLevel,
    },
    /// Show skills with no experts or a single holder
    Gaps,
    /// Show team-wide counts and the most common skills
    Summary,
    /// List every skill by category
    Skills,
    /// Call a tool by name with JSON arguments
    Call {
        /// Tool name
        #[arg(value_name = "TOOL")]
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long, value_name = "JSON")]
        args: Option<String>,

        /// Print server-sent event frames instead of plain text
        #[arg(short, long)]
        stream: bool,
    },
}

fn parse_level(s: &str) -> std::result::Result<ProficiencyLevel, String> {
    ProficiencyLevel::from_str(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from("teamskills.toml"));
    let config = load_config(&config_path, cli.database.clone())?;

    let mut logging = LoggingConfig::from(config.logging.clone());
    if cli.verbose {
        logging = logging.with_level("debug");
    }
    let _guard = init_logging(Some(logging)).context("Failed to initialize logging")?;

    if cli.verbose {
        println!("{} Using config: {}", "Info:".blue().bold(), config_path.display());
        println!("{} Database: {}", "Info:".blue().bold(), config.database.path.display());
    }

    match cli.command {
        Commands::Init => cmd_init(&config, &config_path).await?,
        Commands::Status => cmd_status(&config, &config_path).await?,
        Commands::Tools => cmd_tools(&config)?,
        Commands::Experts { skills, min } => {
            let args = json!({ "skills": skills, "min_proficiency": min.code() });
            print_text(&config, experts::TOOL_NAME, args).await?
        }
        Commands::Gaps => print_text(&config, gaps::TOOL_NAME, json!({})).await?,
        Commands::Summary => print_text(&config, summary::TOOL_NAME, json!({})).await?,
        Commands::Skills => print_text(&config, catalog::TOOL_NAME, json!({})).await?,
        Commands::Call { tool, args, stream } => {
            let args = parse_arguments(args.as_deref())?;
            if stream {
                cmd_stream(&config, &tool, args).await?
            } else {
                print_text(&config, &tool, args).await?
            }
        }
    }

    Ok(())
}

/// Load the config file (defaults when absent) and apply the `--database` override
fn load_config(path: &Path, database: Option<PathBuf>) -> Result<Config> {
    let mut config =
        Config::load(path).with_context(|| format!("Failed to load config from {}", path.display()))?;
    if let Some(database) = database {
        config.database.path = database;
    }
    Ok(config)
}

fn parse_arguments(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(json!({}));
    };
    let value: Value = serde_json::from_str(raw).context("Tool arguments are not valid JSON")?;
    if !value.is_object() {
        anyhow::bail!("Tool arguments must be a JSON object");
    }
    Ok(value)
}

fn call_id() -> String {
    format!("call_{}", chrono::Utc::now().timestamp_millis())
}

/// Open the pool and wire the four tools over it
async fn open(config: &Config) -> Result<(Arc<Database>, ToolDispatcher)> {
    let db = Arc::new(Database::new(&config.database));
    db.connect()
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path.display()))?;

    let registry = default_registry(db.clone(), &config.tools).context("Failed to register tools")?;
    let privacy = LoggingConfig::from(config.logging.clone()).privacy;
    Ok((db, ToolDispatcher::new(registry).with_privacy(privacy)))
}

async fn invoke(config: &Config, tool: &str, args: Value) -> Result<ToolResult> {
    let (db, dispatcher) = open(config).await?;
    let result = dispatcher.execute(&ToolCall::new(call_id(), tool, args)).await;
    db.disconnect().await;
    result.with_context(|| format!("Tool '{}' failed", tool))
}

async fn print_text(config: &Config, tool: &str, args: Value) -> Result<()> {
    let result = invoke(config, tool, args).await?;
    if let Some(error) = result.error {
        anyhow::bail!(error);
    }
    println!("{}", result.content);
    Ok(())
}

/// Print the run as SSE frames; Ctrl-C cancels the call
async fn cmd_stream(config: &Config, tool: &str, args: Value) -> Result<()> {
    let (db, dispatcher) = open(config).await?;
    let token = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<StreamEvent>();

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print!("{}", event.to_sse());
        }
    });

    let interrupt = token.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling tool call");
            interrupt.cancel();
        }
    });

    let calls = [ToolCall::new(call_id(), tool, args)];
    let results = dispatcher.stream(&calls, tx, token).await;
    watcher.abort();
    printer.await.context("Event printer stopped unexpectedly")?;
    db.disconnect().await;

    match results.first() {
        Some(result) if result.is_error() => anyhow::bail!(result.text().to_string()),
        Some(_) => Ok(()),
        None => anyhow::bail!("Tool '{}' failed", tool),
    }
}

/// Bootstrap the schema and write an example config when none exists
async fn cmd_init(config: &Config, config_path: &Path) -> Result<()> {
    if !config_path.exists() {
        std::fs::write(config_path, Config::example()).context("Failed to create config")?;
        println!("{} Created config at {}", "Success:".green().bold(), config_path.display());
    }

    let path = &config.database.path;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let version = bootstrap(path)
        .await
        .with_context(|| format!("Failed to initialize {}", path.display()))?;
    println!(
        "{} Database {} is at schema version {}",
        "Success:".green().bold(),
        path.display().cyan(),
        version
    );
    Ok(())
}

async fn schema_version(db: &Database) -> Option<i64> {
    db.fetch_one("SELECT MAX(version) AS version FROM schema_version", &[])
        .await
        .and_then(|row| row.get("version").and_then(Value::as_i64))
}

/// Show current status
async fn cmd_status(config: &Config, config_path: &Path) -> Result<()> {
    println!("{}", "Team Skills Status".green().bold().underline());
    println!();

    println!("{} Configuration", "Info:".blue().bold());
    if config_path.exists() {
        println!("  File: {}", config_path.display().cyan());
    } else {
        println!("  File: {} (not found, using defaults)", config_path.display().yellow());
    }
    println!("  Pool size: {}", config.database.pool_size.to_string().cyan());
    println!(
        "  Limits: gaps {}/{}, top skills {}",
        config.tools.gap_candidate_limit, config.tools.gap_display_limit, config.tools.top_skills_limit
    );

    println!();
    println!("{} Database", "Info:".blue().bold());
    println!("  Path: {}", config.database.path.display().cyan());

    match open(config).await {
        Ok((db, dispatcher)) => {
            println!("  Connected: {}", "yes".green());
            if let Some(version) = schema_version(&db).await {
                println!("  Schema version: {}", version.to_string().cyan());
            }

            let status = dispatcher.status();
            println!();
            println!("{} Tools ({})", "Info:".blue().bold(), status.tools.len());
            for name in &status.tools {
                println!("    - {}", name.cyan());
            }
            db.disconnect().await;
        }
        Err(e) => {
            println!("  Connected: {}", "no".red());
            println!("{} {:#}", "Warning:".yellow().bold(), e);
        }
    }

    println!();
    println!("  Checked at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    Ok(())
}

/// Tool definitions in function-calling JSON form
fn tool_definitions(config: &Config) -> Result<Value> {
    // Definitions only; the pool is never opened
    let db: Arc<dyn QueryExecutor> = Arc::new(Database::new(&config.database));
    let registry = default_registry(db, &config.tools).context("Failed to register tools")?;
    Ok(Value::Array(registry.specs().iter().map(|spec| spec.to_function_json()).collect()))
}

fn cmd_tools(config: &Config) -> Result<()> {
    let definitions = tool_definitions(config)?;
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.database.path = dir.path().join("skills.db");
        config
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["teamskills", "status"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.database.is_none());
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_cli_global_flags() {
        let cli =
            Cli::try_parse_from(["teamskills", "--config", "/etc/ts.toml", "-d", "/tmp/s.db", "-v", "gaps"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/ts.toml")));
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/s.db")));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Gaps));
    }

    #[test]
    fn test_cli_experts_command() {
        let cli = Cli::try_parse_from(["teamskills", "experts", "rust", "go"]).unwrap();
        if let Commands::Experts { skills, min } = cli.command {
            assert_eq!(skills, vec!["rust", "go"]);
            assert_eq!(min, ProficiencyLevel::L200);
        } else {
            panic!("Expected Experts command");
        }

        let cli = Cli::try_parse_from(["teamskills", "experts", "rust", "--min", "l400"]).unwrap();
        if let Commands::Experts { min, .. } = cli.command {
            assert_eq!(min, ProficiencyLevel::L400);
        } else {
            panic!("Expected Experts command");
        }
    }

    #[test]
    fn test_cli_experts_requires_skill_and_valid_level() {
        assert!(Cli::try_parse_from(["teamskills", "experts"]).is_err());
        assert!(Cli::try_parse_from(["teamskills", "experts", "rust", "--min", "guru"]).is_err());
    }

    #[test]
    fn test_cli_call_command() {
        let cli = Cli::try_parse_from(["teamskills", "call", "list_all_skills", "--stream"]).unwrap();
        if let Commands::Call { tool, args, stream } = cli.command {
            assert_eq!(tool, "list_all_skills");
            assert!(args.is_none());
            assert!(stream);
        } else {
            panic!("Expected Call command");
        }
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(None).unwrap(), json!({}));
        assert_eq!(parse_arguments(Some(r#"{"skills": ["go"]}"#)).unwrap(), json!({"skills": ["go"]}));
        assert!(parse_arguments(Some("{not json")).is_err());
        assert!(parse_arguments(Some("[1, 2]")).is_err());
    }

    #[test]
    fn test_load_config_missing_file_and_override() {
        let temp = TempDir::new().unwrap();
        let override_path = temp.path().join("override.db");
        let config = load_config(&temp.path().join("absent.toml"), Some(override_path.clone())).unwrap();
        assert_eq!(config.database.path, override_path);
        assert_eq!(config.tools.top_skills_limit, 5);
    }

    #[test]
    fn test_load_config_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("teamskills.toml");
        std::fs::write(&path, "[database]\npool_size = 0\n").unwrap();
        assert!(load_config(&path, None).is_err());
    }

    #[test]
    fn test_tool_definitions() {
        let temp = TempDir::new().unwrap();
        let definitions = tool_definitions(&test_config(&temp)).unwrap();
        let names: Vec<&str> =
            definitions.as_array().unwrap().iter().map(|d| d["function"]["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["find_experts_by_skills", "get_skill_summary", "get_team_skill_gaps", "list_all_skills"]);
        assert!(!temp.path().join("skills.db").exists());
    }

    #[tokio::test]
    async fn test_init_then_query() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let config_path = temp.path().join("teamskills.toml");

        cmd_init(&config, &config_path).await.unwrap();
        assert!(config_path.exists());
        assert!(std::fs::read_to_string(&config_path).unwrap().contains("[database]"));

        let result = invoke(&config, "list_all_skills", json!({})).await.unwrap();
        assert_eq!(result.content, "No skills found in the database.");

        cmd_status(&config, &config_path).await.unwrap();
        cmd_init(&config, &config_path).await.unwrap();
    }

    #[tokio::test]
    async fn test_invoke_without_database_fails() {
        let temp = TempDir::new().unwrap();
        let err = invoke(&test_config(&temp), "list_all_skills", json!({})).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to open database"));
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        cmd_init(&config, &temp.path().join("teamskills.toml")).await.unwrap();
        assert!(invoke(&config, "drop_tables", json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_stream_reports_tool_error() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        cmd_init(&config, &temp.path().join("teamskills.toml")).await.unwrap();

        cmd_stream(&config, "get_skill_summary", json!({})).await.unwrap();
        let bad = json!({"skills": ["go"], "min_proficiency": "guru"});
        assert!(cmd_stream(&config, "find_experts_by_skills", bad).await.is_err());

        let err = cmd_stream(&config, "drop_tables", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("drop_tables"));
    }

    #[tokio::test]
    async fn test_status_without_database() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        cmd_status(&config, &temp.path().join("teamskills.toml")).await.unwrap();
    }
}
