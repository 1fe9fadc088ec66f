//! pabal-mcp - ASO metadata MCP server
//!
//! Speaks MCP over stdio. Stdout belongs to the protocol, so every log line
//! goes to stderr or the rolling log file.

mod format;
mod schemas;
mod server;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pabal_core::config::defaults::{APP_DIR_NAME, CONFIG_ENV};
use pabal_core::{load_config, ConfigOverrides, ServiceContext};
use rmcp::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use server::PabalMcp;

/// MCP server for App Store Connect and Google Play metadata
#[derive(Debug, Parser)]
#[command(name = "pabal-mcp", version, about)]
struct Cli {
    /// Credentials file (defaults to ./secrets/aso-config.json, then the user config dir)
    #[arg(long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Directory holding the .aso data folder
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _guard = init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("pabal-mcp stopped: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&ConfigOverrides {
        config_path: cli.config,
        data_dir: cli.data_dir,
    })
    .context("Failed to load configuration")?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        source = ?config.source,
        app_store = config.app_store.is_some(),
        google_play = config.google_play.is_some(),
        "configuration loaded"
    );

    let ctx = Arc::new(ServiceContext::from_config(config));
    let mcp_server = PabalMcp::new(ctx);

    tracing::info!("Starting MCP server on stdio transport");
    let service = mcp_server
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP server")?;

    service.waiting().await.context("MCP server error")?;
    Ok(())
}

/// Set up tracing with two layers:
/// - stderr: controlled by RUST_LOG (default: info)
/// - file: debug-level JSON under the user data dir
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_filter(console_filter);

    if let Some(log_dir) = log_directory() {
        let file_appender = tracing_appender::rolling::daily(&log_dir, "pabal-mcp.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(console)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_filter(EnvFilter::new("debug")),
            )
            .init();

        return Some(guard);
    }

    tracing_subscriber::registry().with(console).init();
    None
}

/// Returns the log directory path, creating it if needed.
fn log_directory() -> Option<PathBuf> {
    let log_dir = dirs::data_dir()?.join(APP_DIR_NAME).join("logs");
    std::fs::create_dir_all(&log_dir).ok()?;
    Some(log_dir)
}
