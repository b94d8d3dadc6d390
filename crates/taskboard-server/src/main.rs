//! Taskboard Server - HTTP API server binary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use taskboard_server::config::BackendKind;
use taskboard_server::{ServerConfig, run_with_shutdown};

const DEFAULT_LOG_FILTER: &str = "taskboard=info,taskboard_server=info,tower_http=info";

/// Taskboard API server
#[derive(Parser)]
#[command(name = "taskboard-server")]
#[command(about = "HTTP API for role-based task tracking with task dependencies")]
#[command(version)]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long, env = "TASKBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration file
    #[arg(short, long)]
    listen: Option<String>,

    /// Persist to this JSONL file, overrides the configured storage
    #[arg(long)]
    data_file: Option<PathBuf>,
}

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging();

    let mut config = match &args.config {
        Some(path) => match ServerConfig::load(path).await {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };

    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(data_file) = args.data_file {
        config.storage.backend = BackendKind::Jsonl;
        config.storage.data_file = data_file;
    }

    match run_with_shutdown(config, shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
