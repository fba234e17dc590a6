//! connkit - discover/extract/load against a configured backend
//!
//! # Usage
//!
//! ```bash
//! # List collections and their schemas
//! connkit --config connector.jsonc discover
//!
//! # Print records as JSON lines
//! connkit -c connector.jsonc extract --collection contacts --fields id,email
//!
//! # Append JSON lines from stdin
//! connkit -c connector.jsonc load --collection contacts --operation create < contacts.jsonl
//! ```
//!
//! Results go to stdout. Logs and errors go to stderr, and any failure exits
//! with status 1.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use serde_json::json;

use connkit_config::ConnectorConfig;
use connkit_connectors::{ConnectorEngine, ConnectorError};
use connkit_models::Record;
use connkit_observability::{init_tracing, TracingConfig};

/// connkit - discover/extract/load connectors
#[derive(Parser, Debug)]
#[command(name = "connkit")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the connector config (JSON, comments allowed)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the collections the backend exposes
    Discover,

    /// Print the records of one collection
    Extract(ExtractArgs),

    /// Write JSON lines from stdin into one collection
    Load(LoadArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Collection id, as reported by discover
    #[arg(long)]
    collection: String,

    /// Only keep these fields, in this order
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    fields: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Collection id, as reported by discover
    #[arg(long)]
    collection: String,

    /// create, update, upsert or delete
    #[arg(long)]
    operation: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// One JSON object per line
    Jsonl,
    /// A single JSON array
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_tracing(TracingConfig::for_service("connkit").with_level(cli.log_level.as_str()))?;

    let config_path = cli.config.ok_or_else(|| {
        ConnectorError::Configuration("no config file given, pass --config <path>".to_string())
    })?;
    let config = ConnectorConfig::from_path(&config_path).map_err(ConnectorError::from)?;
    let engine = ConnectorEngine::from_config(&config)?;

    match cli.command {
        Command::Discover => discover(&engine).await,
        Command::Extract(args) => extract(&engine, args).await,
        Command::Load(args) => load(&engine, args).await,
    }
}

async fn discover(engine: &ConnectorEngine) -> Result<()> {
    let catalog = engine.discover().await?;
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}

async fn extract(engine: &ConnectorEngine, args: ExtractArgs) -> Result<()> {
    let fields = (!args.fields.is_empty()).then_some(args.fields.as_slice());
    let mut records = engine.extract(&args.collection, fields).await?;

    // Rendered in memory first so a failing row leaves stdout empty
    let mut rendered: Vec<u8> = Vec::new();
    match args.format {
        OutputFormat::Jsonl => {
            while let Some(record) = records.next().await {
                serde_json::to_writer(&mut rendered, &record?)?;
                rendered.push(b'\n');
            }
        }
        OutputFormat::Json => {
            let mut all: Vec<Record> = Vec::new();
            while let Some(record) = records.next().await {
                all.push(record?);
            }
            serde_json::to_writer_pretty(&mut rendered, &all)?;
            rendered.push(b'\n');
        }
    }

    let mut out = std::io::stdout().lock();
    out.write_all(&rendered)?;
    out.flush()?;
    Ok(())
}

async fn load(engine: &ConnectorEngine, args: LoadArgs) -> Result<()> {
    let input = std::io::stdin().lock();
    let result = engine
        .load(&args.collection, &args.operation, input)
        .await?;
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

/// Print the failure as one JSON object on stderr
fn report_error(err: &anyhow::Error) {
    let kind = err
        .downcast_ref::<ConnectorError>()
        .map(ConnectorError::kind)
        .unwrap_or("internal_error");
    eprintln!("{}", json!({ "error": kind, "message": err.to_string() }));
}
