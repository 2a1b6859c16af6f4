// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use crate::journal::JournalSubscriber;
use stately_core::{
    ConfigError, LockToken, ProcessTokenGen, StatelyConfig, SystemClock, TokenGen,
};
use stately_engine::{
    DispatchError, Dispatcher, DispatcherHandle, DispatcherState, RunSummary, SubscriberRegistry,
    Subscription, TracedSubscriber,
};
use stately_storage::{StoreError, WalStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to open journal at {0}: {1}")]
    Journal(PathBuf, std::io::Error),

    #[error("Dispatcher error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A started daemon: the dispatcher task and the token it acquires with
pub struct Daemon {
    pub token: LockToken,
    pub start_time: Instant,
    handle: DispatcherHandle,
}

/// Open the store, register built-in subscribers and start the dispatcher
///
/// Must be called from within a tokio runtime.
pub fn startup(config: &StatelyConfig) -> Result<Daemon, LifecycleError> {
    let store = WalStore::open(&config.store.path)?;
    info!(path = %config.store.path.display(), sequence = store.sequence(), "store opened");

    let subscribers = SubscriberRegistry::new();
    if let Some(path) = &config.daemon.journal_path {
        let journal =
            JournalSubscriber::open(path).map_err(|e| LifecycleError::Journal(path.clone(), e))?;
        info!(path = %journal.path().display(), "journal enabled");
        subscribers.register(
            Subscription::all("journal"),
            Arc::new(TracedSubscriber::new(journal)),
        );
    }

    let token = ProcessTokenGen.next();
    let dispatcher = Dispatcher::new(
        store.clone(),
        SystemClock,
        config.dispatcher.clone(),
        subscribers,
    );
    let handle = dispatcher.start(token.clone());
    info!(lock = %config.dispatcher.lock_name, token = %token, "dispatcher started");

    Ok(Daemon {
        token,
        start_time: Instant::now(),
        handle,
    })
}

impl Daemon {
    pub fn state(&self) -> DispatcherState {
        self.handle.state()
    }

    /// Stop the dispatcher, releasing its lock if held
    pub async fn shutdown(self) -> Result<RunSummary, LifecycleError> {
        info!("Shutting down daemon...");
        let summary = self.handle.stop().await?;
        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            delivered = summary.delivered,
            failed = summary.failed,
            parked = summary.parked,
            "Daemon shutdown complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
