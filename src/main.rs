//! spanlog command line.
//!
//! - `spanlog check <path>` validates a configuration file
//! - `spanlog emit` writes one record through a configuration
//! - `spanlog watch <path>` runs with hot reload and a traced heartbeat

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use opentelemetry::{Context, KeyValue};
use serde_json::Value;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use spanlog::config::{spawn_reloader, ConfigError, ConfigWatcher};
use spanlog::{field, load_config, Config, Field, InitOptions, Level, LoggerHandle, TracingAgent};

#[derive(Parser)]
#[command(name = "spanlog")]
#[command(about = "Structured logging with trace correlation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Check { path: PathBuf },
    /// Emit one record
    Emit {
        /// Configuration file; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, default_value = "info")]
        level: Level,

        message: String,

        /// Extra field as key=value; JSON values are kept typed
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<Field>,
    },
    /// Run with hot reload, emitting a traced heartbeat
    Watch {
        path: PathBuf,

        /// Seconds between heartbeats
        #[arg(short, long, default_value_t = 5)]
        interval: u64,
    },
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    // exporter errors and `tracing` events from dependencies reach the logger
    tracing_subscriber::registry().with(spanlog::layer()).try_init()?;

    match cli.command {
        Commands::Check { path } => Ok(check(&path)),
        Commands::Emit {
            config,
            level,
            message,
            fields,
        } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => Config::default(),
            };
            spanlog::initialize(&config)?;
            spanlog::emit(level, &message, &fields);
            spanlog::flush()?;
            TracingAgent::global().shutdown();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Watch { path, interval } => {
            let config = load_config(&path)?;
            spanlog::initialize(&config)?;

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(watch(&path, Duration::from_secs(interval.max(1))))?;
            // The exporters' blocking HTTP clients must be dropped outside the runtime
            drop(runtime);

            TracingAgent::global().shutdown();
            spanlog::flush()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check(path: &Path) -> ExitCode {
    match load_config(path) {
        Ok(config) => {
            println!(
                "{}: ok (level={}, format={}, mode={})",
                path.display(),
                config.level,
                config.format,
                config.mode
            );
            ExitCode::SUCCESS
        }
        Err(ConfigError::Validation(errors)) => {
            eprintln!("{}: {} invalid setting(s)", path.display(), errors.len());
            for error in errors {
                eprintln!("  {}: {}", error.field(), error);
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            ExitCode::FAILURE
        }
    }
}

async fn watch(path: &Path, interval: Duration) -> Result<(), Box<dyn Error>> {
    let (watcher, updates) = ConfigWatcher::new(path);
    let _watcher = watcher.run()?;
    let reloader = spawn_reloader(
        LoggerHandle::global().clone(),
        TracingAgent::global(),
        updates,
        InitOptions::new,
    );

    let mut ticks = tokio::time::interval(interval);
    let mut beat: u64 = 0;
    loop {
        tokio::select! {
            _ = ticks.tick() => {
                beat += 1;
                let (cx, span) = spanlog::start_trace(&Context::current(), "heartbeat");
                span.set_attribute(KeyValue::new("beat", beat as i64));
                spanlog::with_context(&cx).info("heartbeat", &[field("beat", beat)]);
                span.end();
            }
            _ = tokio::signal::ctrl_c() => {
                spanlog::info("shutdown signal received", &[]);
                break;
            }
        }
    }

    reloader.abort();
    Ok(())
}

fn parse_field(raw: &str) -> Result<Field, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    if key.is_empty() {
        return Err("field key is empty".to_string());
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok(Field::new(key.to_string(), value))
}
