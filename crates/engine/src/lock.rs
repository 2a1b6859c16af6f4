// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named distributed locks backed by process rows
//!
//! Each operation reads the row, runs the pure [`ProcessRow::transition`]
//! and writes the result inside one store transaction. The store serializes
//! transactions across processes, so two contenders can never both observe
//! the lock as free.

use crate::events::log_events;
use stately_core::{Clock, LockInput, LockToken, ProcessRow};
use stately_storage::{Store, StoreError};
use std::time::Duration;

pub struct DistributedLock<S: Store, C: Clock> {
    store: S,
    clock: C,
    lease: Option<Duration>,
}

impl<S: Store, C: Clock> Clone for DistributedLock<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
            lease: self.lease,
        }
    }
}

impl<S: Store, C: Clock> DistributedLock<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            lease: None,
        }
    }

    /// Allow a holder whose heartbeat is older than `lease` to be displaced
    pub fn with_lease(mut self, lease: Option<Duration>) -> Self {
        self.lease = lease;
        self
    }

    /// Try to take the lock; true when `token` holds it afterwards
    pub fn acquire(&self, name: &str, token: &LockToken) -> Result<bool, StoreError> {
        self.acquire_with_notes(name, token, None)
    }

    pub fn acquire_with_notes(
        &self,
        name: &str,
        token: &LockToken,
        notes: Option<String>,
    ) -> Result<bool, StoreError> {
        let input = LockInput::Acquire {
            token: token.clone(),
            notes,
        };
        let (_, next) = self.apply(name, input)?;
        Ok(next.is_held_by(token))
    }

    /// Give the lock up; false when `token` did not hold it
    pub fn release(&self, name: &str, token: &LockToken) -> Result<bool, StoreError> {
        let input = LockInput::Release {
            token: token.clone(),
        };
        let (previous, next) = self.apply(name, input)?;
        Ok(previous.is_held_by(token) && next.is_free())
    }

    /// Refresh the holder's heartbeat; false means the lock was lost
    pub fn heartbeat(&self, name: &str, token: &LockToken) -> Result<bool, StoreError> {
        let input = LockInput::Heartbeat {
            token: token.clone(),
        };
        let (_, next) = self.apply(name, input)?;
        Ok(next.is_held_by(token))
    }

    /// Clear the lock regardless of holder; false when it was already free
    pub fn force_release(&self, name: &str, reason: &str) -> Result<bool, StoreError> {
        let input = LockInput::ForceRelease {
            reason: reason.to_string(),
        };
        let (previous, next) = self.apply(name, input)?;
        Ok(previous.acquired && !next.acquired)
    }

    pub fn status(&self, name: &str) -> Result<Option<ProcessRow>, StoreError> {
        self.store.process(name)
    }

    /// Run one transition atomically, returning the rows before and after
    fn apply(&self, name: &str, input: LockInput) -> Result<(ProcessRow, ProcessRow), StoreError> {
        let now = self.clock.utc_now();
        let (previous, next, events) = self.store.transact(|tx| {
            let current = tx
                .process(name)
                .unwrap_or_else(|| ProcessRow::new(name, now));
            let (next, events) = current.transition(input, now, self.lease);
            if next.version != current.version {
                tx.put_process(next.clone());
            }
            Ok::<_, StoreError>((current, next, events))
        })?;
        log_events(&events);
        Ok((previous, next))
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
