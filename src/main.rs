//! Cardiorisk: cardiovascular risk scoring CLI
//!
//! Reads one JSON request document (file or stdin), writes one JSON response
//! document to stdout. Logs go to stderr or a file, never stdout.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::sanitize::SanitizingMakeWriter;
use cardiorisk::config::PipelineConfig;
use cardiorisk::application::{requests, Request};
use cardiorisk::{CardioriskError, Pipeline};

#[derive(Parser)]
#[command(name = "cardiorisk")]
#[command(version, about = "Cardiovascular risk scoring with tiered fallback")]
struct Cli {
    /// Pretty-print the response document
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Request document (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess `{ "health_data": {...} }`
    Analyze(InputArgs),

    /// Assess a bare health profile object
    Predict(InputArgs),

    /// Answer `{ "message": ..., "user_data": {...} }`
    Chat(InputArgs),

    /// Generate `{ "plan_type": "diet"|"exercise", "health_data": {...} }`
    Plan(InputArgs),

    /// Show which providers are available
    Status,
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // stdout carries the response document, so logs default to stderr.
    let log_mode = std::env::var("CARDIORISK_LOG_MODE").unwrap_or_else(|_| "stderr".to_string());

    let (writer, guard) = if log_mode == "file" {
        let log_file = std::env::var("CARDIORISK_LOG_FILE")
            .unwrap_or_else(|_| "cardiorisk.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Cannot open log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

fn read_document(input: &InputArgs) -> Result<Value> {
    let raw = match &input.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Cannot read request from stdin")?;
            buf
        }
    };
    let document = serde_json::from_str(&raw).map_err(CardioriskError::from)?;
    Ok(document)
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

/// Read and validate the request before any provider is built, so a
/// malformed document never costs a provider call.
fn read_request(command: Commands) -> Result<Option<Request>> {
    let request = match command {
        Commands::Analyze(input) => {
            Request::Analyze(requests::parse_analyze(&read_document(&input)?)?)
        }
        Commands::Predict(input) => {
            Request::Predict(requests::parse_predict(&read_document(&input)?)?)
        }
        Commands::Chat(input) => Request::Chat(requests::parse_chat(&read_document(&input)?)?),
        Commands::Plan(input) => Request::Plan(requests::parse_plan(&read_document(&input)?)?),
        Commands::Status => return Ok(None),
    };
    Ok(Some(request))
}

fn run(cli: Cli) -> Result<()> {
    let request = read_request(cli.command)?;

    let mut config = PipelineConfig::from_env_or_default();
    if request.is_some() {
        // A one-shot request is itself the first provider call.
        config.skip_reasoning_probe = true;
    }
    let pipeline = Pipeline::from_config(&config);

    match request {
        Some(request) => emit(&pipeline.handle(&request)?, cli.pretty),
        None => emit(&pipeline.status(), cli.pretty),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("cardiorisk: {e:#}");
            return ExitCode::from(1);
        }
    };

    tracing::debug!("Starting cardiorisk...");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let client = e
                .downcast_ref::<CardioriskError>()
                .is_some_and(CardioriskError::is_client_error);
            tracing::error!("Request failed: {e:#}");
            eprintln!("cardiorisk: {e:#}");
            ExitCode::from(if client { 2 } else { 1 })
        }
    }
}
