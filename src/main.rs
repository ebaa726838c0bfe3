//! CLI entry point: load GTFS-realtime feeds into a database on a timer.

use std::ffi::OsStr;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gtfs_rt_db::{
    config::{Args, IngestConfig},
    fetch::{BasicClient, ExtraHeaders},
    ingest::Ingester,
    store::{self, schema},
};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const EXIT_CONFIG: u8 = 2;
const EXIT_MISSING_TABLES: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // Load .env file

    let args = Args::parse();
    let _file_guard = init_logging(&args);

    let config = match IngestConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match run(config).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = ?e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

/// Colored stderr at the level chosen by `-v`/`-q`, plus a JSON rolling log file.
fn init_logging(args: &Args) -> WorkerGuard {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gtfs_rt_db.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs_rt_db.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let level = if args.quiet {
        LevelFilter::ERROR
    } else if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::builder()
                .with_env_var("RUST_LOG_JSON")
                .with_default_directive(LevelFilter::DEBUG.into())
                .from_env_lossy(),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

/// Connects the store, checks its tables and runs the loop until it stops.
async fn run(config: IngestConfig) -> Result<ExitCode> {
    let mut conn = store::connect(&config.database)
        .await
        .context("Failed to connect to the database")?;

    let missing = schema::missing_tables(&mut conn).await?;
    if !missing.is_empty() {
        if config.create_tables {
            schema::create_tables(&mut conn).await?;
        } else {
            for table in &missing {
                error!(table, "Missing table! Use -c to create it.");
            }
            return Ok(ExitCode::from(EXIT_MISSING_TABLES));
        }
    }

    let client = ExtraHeaders::new(
        BasicClient::new().context("Failed to build HTTP client")?,
        config.headers.clone(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let reason = Ingester::new(client, conn, config).run(shutdown_rx).await;
    info!(?reason, "Stopped");
    Ok(ExitCode::SUCCESS)
}

/// Listen for SIGTERM or ctrl-c.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};
    let ctrl_c = tokio::signal::ctrl_c();

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => info!("SIGTERM received"),
                _ = ctrl_c => info!("ctrl-c received"),
            }
        }
        Err(_) => {
            ctrl_c.await.ok();
            info!("ctrl-c received");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("ctrl-c received");
}
