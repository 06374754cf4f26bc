// gotools-server/src/main.rs

mod cli;
mod server;
mod tools;

use anyhow::{Context, Result};
use clap::Parser;
use gotools_core::GoToolsConfig;
use rmcp::{ServiceExt, transport::stdio};
use server::GoToolsServer;
use std::process::ExitCode;
use std::sync::Arc;
use std::{env, fs, io};
use time::macros::format_description;
use tracing::{Level, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, fmt::time::LocalTime, prelude::*};

const LOG_FILE_NAME: &str = "gotools-server.log";

/// Installs the stderr layer and, unless disabled, the file layer.
///
/// Stdout carries the protocol, so nothing may log there. The returned guard
/// flushes the file writer when dropped.
fn init_logging(cli: &cli::Cli) -> Result<Option<WorkerGuard>> {
    let default_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_timer(timer.clone())
        .with_target(false)
        .with_level(true);

    let log_dir = if cli.no_log_file {
        None
    } else {
        cli.log_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("gotools")))
            .or_else(|| Some(env::temp_dir().join("gotools")))
    };

    let (file_layer, guard, log_path) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(timer)
                .with_target(true)
                .with_line_number(true);
            (Some(layer), Some(guard), Some(dir.join(LOG_FILE_NAME)))
        }
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    info!(
        "Logging initialized. Level determined by RUST_LOG or -v flags (default: {}). Log file: {}",
        default_level,
        log_path.map_or_else(|| "disabled".to_string(), |p| p.display().to_string())
    );
    Ok(guard)
}

async fn run(cli: cli::Cli) -> Result<()> {
    let config = GoToolsConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    if config.execution.timeout().is_none() {
        warn!("Command deadline disabled; a hung tool will block its request indefinitely");
    }

    let server = GoToolsServer::new(Arc::new(config));
    info!("Starting gotools MCP server...");

    let service = server
        .serve(stdio())
        .await
        .context("Failed to start MCP service on stdio")?;
    service.waiting().await.context("MCP service loop failed")?;

    info!("gotools MCP server stopped.");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = cli::Cli::parse();

    let _guard = match init_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
