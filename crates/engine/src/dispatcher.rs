// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-log dispatcher
//!
//! At most one dispatcher per lock name runs at a time. The holder polls
//! unprocessed state-log entries in id order and hands each to every
//! matching subscriber. An entry is marked processed once all of them
//! accepted; otherwise it is retried after a backoff until it runs out of
//! attempts and is parked for an operator.
//!
//! ```text
//!  Idle --start--> Starting --acquired--> Running --stop--> Stopping --> Idle
//!   ^                 |                     |
//!   +----contested----+                     +--lock lost--> Starting
//! ```

use crate::error::DispatchError;
use crate::events::log_event;
use crate::lock::DistributedLock;
use crate::subscriber::{Delivery, StateEvent, Subscriber, SubscriberRegistry};
use stately_core::{Clock, DispatcherConfig, Event, LockToken, StateLogEntry};
use stately_storage::{Store, Transaction};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Not holding the lock
    Idle,
    /// Trying to acquire the lock
    Starting,
    /// Holding the lock and delivering entries
    Running,
    /// Finishing up and releasing the lock
    Stopping,
}

impl std::fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DispatcherState::Idle => "idle",
            DispatcherState::Starting => "starting",
            DispatcherState::Running => "running",
            DispatcherState::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

/// Result of one poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub fetched: usize,
    pub delivered: usize,
    pub failed: usize,
    pub parked: usize,
}

/// Totals over a dispatcher's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub delivered: usize,
    pub failed: usize,
    pub parked: usize,
    pub batches: usize,
    pub acquisitions: usize,
    pub lock_lost: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &BatchOutcome) {
        self.delivered += outcome.delivered;
        self.failed += outcome.failed;
        self.parked += outcome.parked;
        if outcome.fetched > 0 {
            self.batches += 1;
        }
    }
}

/// How a stretch of holding the lock ended
enum Held {
    Cancelled,
    Lost,
}

pub struct Dispatcher<S: Store, C: Clock> {
    store: S,
    clock: C,
    config: DispatcherConfig,
    subscribers: SubscriberRegistry,
    lock: DistributedLock<S, C>,
}

impl<S: Store, C: Clock> Dispatcher<S, C> {
    pub fn new(store: S, clock: C, config: DispatcherConfig, subscribers: SubscriberRegistry) -> Self {
        let lock = DistributedLock::new(store.clone(), clock.clone()).with_lease(config.lease);
        Self {
            store,
            clock,
            config,
            subscribers,
            lock,
        }
    }

    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.subscribers
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Deliver one batch of due entries
    ///
    /// Does not touch the lock; callers outside [`start`](Self::start) are
    /// responsible for holding it.
    pub async fn dispatch_batch(&self) -> Result<BatchOutcome, DispatchError> {
        self.dispatch(None).await
    }

    /// Deliver one batch; with an `owner`, every entry is settled only
    /// while that token still holds the lock
    async fn dispatch(&self, owner: Option<&LockToken>) -> Result<BatchOutcome, DispatchError> {
        let now = self.clock.utc_now();
        let entries = self
            .store
            .pending(self.config.batch_size, now, self.config.max_attempts)?;

        let mut outcome = BatchOutcome {
            fetched: entries.len(),
            ..BatchOutcome::default()
        };
        if !entries.is_empty() {
            tracing::debug!(count = entries.len(), "fetched pending entries");
        }

        for entry in entries {
            let event = StateEvent::from(&entry);
            let subscribers = self.subscribers.matching(&event.name());
            let count = subscribers.len();

            match self.deliver(event, subscribers).await {
                None => {
                    let at = self.clock.utc_now();
                    self.store.transact(|tx| {
                        self.ensure_owner(&*tx, owner)?;
                        Ok::<_, DispatchError>(tx.mark_processed(entry.id, at)?)
                    })?;
                    outcome.delivered += 1;
                    log_event(&Event::EntryDelivered {
                        log_id: entry.id,
                        subscribers: count,
                    });
                }
                Some(reason) => {
                    if self.fail(&entry, reason, owner)? {
                        outcome.parked += 1;
                    } else {
                        outcome.failed += 1;
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Refuse to settle entries once `owner` has lost the lock
    fn ensure_owner(
        &self,
        tx: &dyn Transaction,
        owner: Option<&LockToken>,
    ) -> Result<(), DispatchError> {
        let Some(token) = owner else {
            return Ok(());
        };
        let name = &self.config.lock_name;
        match tx.process(name) {
            Some(process) if process.is_held_by(token) => Ok(()),
            _ => Err(DispatchError::LockLost(name.clone())),
        }
    }

    /// Invoke every subscriber; returns the first failure reason
    async fn deliver(
        &self,
        event: StateEvent,
        subscribers: Vec<Arc<dyn Subscriber>>,
    ) -> Option<String> {
        let event = Arc::new(event);
        let mut failure = None;

        for subscriber in subscribers {
            let name = subscriber.name().to_string();
            let shared = Arc::clone(&event);
            let mut task = tokio::spawn(async move { subscriber.deliver(&shared).await });
            let _abort = AbortOnDrop(task.abort_handle());

            let reason = match tokio::time::timeout(self.config.delivery_timeout, &mut task).await {
                Ok(Ok(Delivery::Accept)) => None,
                Ok(Ok(Delivery::Reject(reason))) => Some(reason),
                Ok(Err(e)) => Some(format!("subscriber panicked: {e}")),
                Err(_) => {
                    Some(format!(
                        "timed out after {}ms",
                        self.config.delivery_timeout.as_millis()
                    ))
                }
            };

            if let Some(reason) = reason {
                tracing::debug!(log_id = event.log_id, subscriber = %name, reason = %reason, "delivery failed");
                if failure.is_none() {
                    failure = Some(format!("{name}: {reason}"));
                }
            }
        }

        failure
    }

    /// Record a failed attempt; true when the entry is now parked
    fn fail(
        &self,
        entry: &StateLogEntry,
        reason: String,
        owner: Option<&LockToken>,
    ) -> Result<bool, DispatchError> {
        let at = self.clock.utc_now();
        let delay = self.config.retry_delay(entry.attempts + 1);
        let retry_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| at.checked_add_signed(d));

        let updated = self.store.transact(|tx| {
            self.ensure_owner(&*tx, owner)?;
            Ok::<_, DispatchError>(tx.mark_failed(entry.id, at, retry_at, &reason)?)
        })?;
        let parked = updated.is_parked(self.config.max_attempts);
        let event = if parked {
            Event::EntryParked {
                log_id: entry.id,
                attempts: updated.attempts,
                reason,
            }
        } else {
            Event::EntryFailed {
                log_id: entry.id,
                attempts: updated.attempts,
                reason,
            }
        };
        log_event(&event);
        Ok(parked)
    }

    /// Spawn the run loop on the current tokio runtime
    pub fn start(self, token: LockToken) -> DispatcherHandle {
        let (state_tx, state_rx) = watch::channel(DispatcherState::Idle);
        let cancel = CancellationToken::new();
        let span = tracing::info_span!(
            "dispatcher",
            lock = %self.config.lock_name,
            token = %token
        );
        let task = tokio::spawn(self.run(token, state_tx, cancel.clone()).instrument(span));
        DispatcherHandle {
            state: state_rx,
            cancel,
            task,
        }
    }

    async fn run(
        self,
        token: LockToken,
        state: watch::Sender<DispatcherState>,
        cancel: CancellationToken,
    ) -> RunSummary {
        let name = self.config.lock_name.clone();
        let mut summary = RunSummary::default();

        if !self.config.enabled {
            tracing::info!("dispatcher disabled");
            cancel.cancelled().await;
            return summary;
        }

        let notes = holder_notes();
        let mut holding = false;

        while !cancel.is_cancelled() {
            state.send_replace(DispatcherState::Starting);
            match self
                .lock
                .acquire_with_notes(&name, &token, Some(notes.clone()))
            {
                Ok(true) => {}
                Ok(false) => {
                    state.send_replace(DispatcherState::Idle);
                    if !sleep_or_cancel(&cancel, self.config.acquire_backoff).await {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    tracing::error!(lock = %name, error = %e, "acquire failed");
                    state.send_replace(DispatcherState::Idle);
                    if !sleep_or_cancel(&cancel, self.config.acquire_backoff).await {
                        break;
                    }
                    continue;
                }
            }

            holding = true;
            summary.acquisitions += 1;
            state.send_replace(DispatcherState::Running);
            tracing::info!(lock = %name, "dispatcher running");

            match self.run_held(&token, &cancel, &mut summary).await {
                Held::Cancelled => break,
                Held::Lost => {
                    holding = false;
                    summary.lock_lost += 1;
                    tracing::warn!(lock = %name, "lock lost, reacquiring");
                }
            }
        }

        if holding {
            state.send_replace(DispatcherState::Stopping);
            match self.lock.release(&name, &token) {
                Ok(_) => {}
                Err(e) => tracing::error!(lock = %name, error = %e, "release failed"),
            }
        }
        state.send_replace(DispatcherState::Idle);
        tracing::info!(
            lock = %name,
            delivered = summary.delivered,
            failed = summary.failed,
            parked = summary.parked,
            "dispatcher stopped"
        );
        summary
    }

    /// Deliver batches while the lock is held
    async fn run_held(
        &self,
        token: &LockToken,
        cancel: &CancellationToken,
        summary: &mut RunSummary,
    ) -> Held {
        let name = &self.config.lock_name;
        let mut last_heartbeat = tokio::time::Instant::now();

        loop {
            if cancel.is_cancelled() {
                return Held::Cancelled;
            }

            if last_heartbeat.elapsed() >= self.config.heartbeat_interval {
                match self.lock.heartbeat(name, token) {
                    Ok(true) => last_heartbeat = tokio::time::Instant::now(),
                    Ok(false) => return Held::Lost,
                    Err(e) => tracing::error!(lock = %name, error = %e, "heartbeat failed"),
                }
            }

            let idle = match self.dispatch_held(token).await {
                Ok(outcome) => {
                    summary.record(&outcome);
                    last_heartbeat = tokio::time::Instant::now();
                    outcome.fetched == 0
                }
                Err(DispatchError::LockLost(_)) => return Held::Lost,
                Err(e) => {
                    tracing::error!(error = %e, "dispatch failed");
                    true
                }
            };

            if idle && !sleep_or_cancel(cancel, self.poll_wait()).await {
                return Held::Cancelled;
            }
        }
    }

    /// One batch, heartbeating while deliveries are in flight
    ///
    /// Dropping the batch on a failed heartbeat aborts the running delivery;
    /// its entry stays unprocessed for the next holder.
    async fn dispatch_held(&self, token: &LockToken) -> Result<BatchOutcome, DispatchError> {
        let name = &self.config.lock_name;
        let batch = self.dispatch(Some(token));
        tokio::pin!(batch);

        let mut ticker = tokio::time::interval(self.config.heartbeat_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                result = &mut batch => return result,
                _ = ticker.tick() => match self.lock.heartbeat(name, token) {
                    Ok(true) => {}
                    Ok(false) => return Err(DispatchError::LockLost(name.clone())),
                    Err(e) => tracing::error!(lock = %name, error = %e, "heartbeat failed"),
                },
            }
        }
    }

    /// Sleep between empty polls, short enough to keep the heartbeat on time
    fn poll_wait(&self) -> Duration {
        self.config.poll_interval.min(self.config.heartbeat_interval)
    }
}

/// Handle to a running dispatcher task
pub struct DispatcherHandle {
    state: watch::Receiver<DispatcherState>,
    cancel: CancellationToken,
    task: JoinHandle<RunSummary>,
}

impl DispatcherHandle {
    pub fn state(&self) -> DispatcherState {
        *self.state.borrow()
    }

    /// Receiver for state changes
    pub fn subscribe(&self) -> watch::Receiver<DispatcherState> {
        self.state.clone()
    }

    /// Wait until the dispatcher reaches `target`; false if it exited first
    pub async fn wait_for(&self, target: DispatcherState) -> bool {
        let mut rx = self.state.clone();
        let reached = rx.wait_for(|s| *s == target).await.is_ok();
        reached
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel, let the current batch finish, release the lock
    pub async fn stop(self) -> Result<RunSummary, DispatchError> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| DispatchError::Join(e.to_string()))
    }

    /// Kill the task without releasing the lock
    pub fn abort(self) {
        self.task.abort();
    }
}

/// Aborts a spawned delivery when the batch owning it is dropped
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Who holds the lock, for operators reading `lock status`
fn holder_notes() -> String {
    format!("host={} pid={}", stately_core::hostname(), std::process::id())
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
