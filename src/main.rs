//! pgchat CLI Entry Point
//!
//! Subcommands:
//! - `chat` (default) - Interactive natural-language session
//! - `check` - Open the configured connection and report server information
//! - `query` - Run one SQL statement and print the result
//!
//! `check` and `query` print a single JSON envelope to stdout. Logs go to
//! stderr (`RUST_LOG`, default `warn`).

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use pgchat::agent::groq::DEFAULT_MODEL;
use pgchat::{
    config, open_handle, query, shell, ChatError, ChatSession, ConnectionInfo, ErrorEnvelope,
    GroqAgent, Metadata, QueryResult, SuccessEnvelope, DEFAULT_CONFIG_FILE, DEFAULT_SECTION,
};

/// pgchat - Ask questions of a PostgreSQL database in plain language
#[derive(Parser)]
#[command(name = "pgchat")]
#[command(about = "Ask natural-language questions of a PostgreSQL database")]
#[command(version)]
struct Cli {
    /// Settings file holding the connection parameters
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Section of the settings file to read
    #[arg(long, global = true, default_value = DEFAULT_SECTION)]
    section: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session (default)
    Chat(ChatArgs),

    /// Validate the configured connection
    Check,

    /// Execute one SQL statement
    Query {
        /// Statement to run; a trailing `;` is optional
        sql: String,
    },
}

#[derive(Args)]
struct ChatArgs {
    /// Groq API key (prompted for when absent)
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model to answer with
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,
}

impl Default for ChatArgs {
    fn default() -> Self {
        Self {
            api_key: std::env::var("GROQ_API_KEY").ok(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Chat(ref args)) => finish(chat(&cli, args).await),
        None => finish(chat(&cli, &ChatArgs::default()).await),
        Some(Commands::Check) => check(&cli).await,
        Some(Commands::Query { ref sql }) => run_query(&cli, sql).await,
    }
}

fn finish(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Interactive session; every error returned from here is fatal
async fn chat(cli: &Cli, args: &ChatArgs) -> anyhow::Result<()> {
    // The key is checked before touching the database or the model service
    let api_key = match args.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => prompt_api_key()?,
    };

    let settings =
        config::load(&cli.config, &cli.section).context("Database configuration failed")?;
    let database = open_handle(&settings).await.context("Failed to configure the database")?;

    let agent = GroqAgent::new(api_key, args.model.clone());
    tracing::info!(model = agent.model(), "session started");

    let mut session = ChatSession::new(database, agent);
    shell::run(&mut session).await;

    Ok(())
}

fn prompt_api_key() -> anyhow::Result<String> {
    let key = dialoguer::Password::new()
        .with_prompt("Groq API Key")
        .allow_empty_password(true)
        .interact()
        .context("Could not read the API key")?;

    let key = key.trim();
    if key.is_empty() {
        return Err(ChatError::MissingApiKey.into());
    }
    Ok(key.to_string())
}

async fn check(cli: &Cli) -> ExitCode {
    let start = Instant::now();

    let result = inspect(cli).await;

    let meta = Metadata::new(elapsed_ms(start));
    emit("check", result.map(|info| (info, meta)))
}

async fn run_query(cli: &Cli, sql: &str) -> ExitCode {
    let start = Instant::now();

    let result = execute_once(cli, sql).await;

    emit(
        "query",
        result.map(|data| {
            let meta = Metadata::with_rows(elapsed_ms(start), data.rows.len());
            (data, meta)
        }),
    )
}

async fn inspect(cli: &Cli) -> pgchat::Result<ConnectionInfo> {
    let settings = config::load(&cli.config, &cli.section)?;
    let database = open_handle(&settings).await?;
    database.server_info().await
}

async fn execute_once(cli: &Cli, sql: &str) -> pgchat::Result<QueryResult> {
    let settings = config::load(&cli.config, &cli.section)?;
    let database = open_handle(&settings).await?;
    query::execute(&database, sql).await
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Print one envelope and pick the exit code
fn emit<T: serde::Serialize>(command: &str, result: pgchat::Result<(T, Metadata)>) -> ExitCode {
    let (json, code) = match result {
        Ok((data, meta)) => (
            serde_json::to_string(&SuccessEnvelope::new(command, data, meta)),
            ExitCode::SUCCESS,
        ),
        Err(e) => (
            serde_json::to_string(&ErrorEnvelope::from_error(command, &e)),
            ExitCode::FAILURE,
        ),
    };

    match json {
        Ok(json) => {
            println!("{json}");
            code
        }
        Err(e) => {
            eprintln!("Error: could not serialize output: {e}");
            ExitCode::FAILURE
        }
    }
}
