// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stately daemon (statelyd)
//!
//! Long-running process hosting the state-log dispatcher. Several daemons
//! may share one store; only the lock holder dispatches, the rest wait.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod journal;
mod lifecycle;

use std::path::{Path, PathBuf};

use stately_core::StatelyConfig;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::lifecycle::LifecycleError;

/// Config file path when neither argv nor the environment name one
const DEFAULT_CONFIG: &str = "stately.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    // Write startup marker to log (before tracing setup, so operators can find it)
    write_startup_marker(config.daemon.log_path.as_deref())?;

    let log_guard = setup_logging(config.daemon.log_path.as_deref())?;

    info!(store = %config.store.path.display(), "Starting statelyd");

    let daemon = match lifecycle::startup(&config) {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(config.daemon.log_path.as_deref(), &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(token = %daemon.token, "Daemon ready");

    // Signal ready for parent process (e.g., systemd, scripts waiting for startup)
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    info!(state = %daemon.state(), "Stopping dispatcher");
    daemon.shutdown().await?;
    info!("Daemon stopped");
    Ok(())
}

/// Config from `argv[1]`, else `STATELY_CONFIG`, else `stately.toml` when present
///
/// `STATELY_STORE` overrides the store path.
fn load_config() -> Result<StatelyConfig, LifecycleError> {
    let explicit = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("STATELY_CONFIG").ok())
        .map(PathBuf::from);

    let mut config = match explicit {
        Some(path) => StatelyConfig::load(&path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            StatelyConfig::load(Path::new(DEFAULT_CONFIG))?
        }
        None => StatelyConfig::default(),
    };

    if let Ok(store) = std::env::var("STATELY_STORE") {
        config = config.with_store_path(store);
    }
    Ok(config)
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- statelyd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- statelyd: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(log_path: Option<&Path>) -> Result<(), LifecycleError> {
    use std::io::Write;

    let Some(log_path) = log_path else {
        return Ok(());
    };
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(log_path: Option<&Path>, error: &LifecycleError) {
    use std::io::Write;

    let Some(log_path) = log_path else {
        eprintln!("ERROR Failed to start daemon: {}", error);
        return;
    };
    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    log_path: Option<&Path>,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (non_blocking, guard) = match log_path {
        Some(log_path) => {
            let dir = log_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = log_path.file_name().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("log path has no file name: {}", log_path.display()),
                )
            })?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}
