use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::{Config, ConfigError};
use crate::report::ReportStore;

mod api;
mod config;
mod error;
mod extractors;
mod report;

pub const NAME: &str = "Comparator";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP API over Android static analysis reports
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Sets a custom config file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("Failed to resolve database path: {0}")]
    DatabasePath(#[from] ConfigError),
    #[error("Failed to build tokio runtime: {0}")]
    Runtime(std::io::Error),
    #[error("Server error: {0}")]
    Server(std::io::Error),
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Setup configuration
    let cfg = match Config::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Setup logging. The guards flush pending lines when main returns.
    let _guards = match cfg.init_logger() {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("Error initializing logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("Starting {NAME} version {VERSION}");

    match run(&cfg) {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &Config) -> Result<(), StartupError> {
    let store = ReportStore::new(cfg.db_path()?);
    info!(database = %store.path().display(), "Report store configured");
    debug!(
        secret_key_set = cfg.secret_key.is_some(),
        debug = cfg.debug,
        "Runtime settings"
    );

    let app = api::create_router(store, &cfg.server.allowed_origins);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    rt.block_on(server(app, cfg.bind_addr())).map_err(StartupError::Server)
}

async fn server(app: axum::Router, addr: String) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!(address = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_reports_startup_failure() {
        let result = run(&Config::default());
        match result {
            Err(e @ StartupError::DatabasePath(ConfigError::MissingDatabaseName)) => {
                assert_eq!(
                    e.to_string(),
                    "Failed to resolve database path: DB_NAME environment variable is not set"
                );
            }
            other => panic!("Expected database path error, got {other:?}"),
        }
    }
}
