// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process lock row
//!
//! One row per lock name. The row is the whole lock: whoever's token is
//! stored while `acquired` is set owns it. Transitions are pure; the engine
//! runs them inside a store transaction and persists the result when the
//! version moved.

use crate::event::Event;
use crate::token::LockToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRow {
    pub name: String,
    pub token: Option<LockToken>,
    pub acquired: bool,
    /// Why the previous holder lost the lock, when it did not release it
    pub error: Option<String>,
    /// Free-form description of the holder (host, pid)
    pub notes: Option<String>,
    pub heartbeat_at: Option<DateTime<Utc>>,
    /// Incremented on every write
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inputs that drive lock transitions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockInput {
    Acquire {
        token: LockToken,
        notes: Option<String>,
    },
    Release {
        token: LockToken,
    },
    Heartbeat {
        token: LockToken,
    },
    /// Operator recovery for a holder that died without releasing
    ForceRelease {
        reason: String,
    },
}

impl ProcessRow {
    /// A fresh, unacquired row
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            token: None,
            acquired: false,
            error: None,
            notes: None,
            heartbeat_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_free(&self) -> bool {
        !self.acquired
    }

    pub fn holder(&self) -> Option<&LockToken> {
        if self.acquired {
            self.token.as_ref()
        } else {
            None
        }
    }

    pub fn is_held_by(&self, token: &LockToken) -> bool {
        self.holder() == Some(token)
    }

    /// Time since the holder last proved it was alive
    pub fn heartbeat_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.heartbeat_at?;
        (now - last).to_std().ok().or(Some(Duration::ZERO))
    }

    /// Whether the holder's heartbeat is older than `lease`.
    ///
    /// Without a lease nothing is ever stale.
    pub fn is_stale(&self, now: DateTime<Utc>, lease: Option<Duration>) -> bool {
        match (self.acquired, lease) {
            (true, Some(lease)) => {
                let last = self.heartbeat_at.unwrap_or(self.updated_at);
                (now - last).to_std().map(|age| age > lease).unwrap_or(false)
            }
            _ => false,
        }
    }

    /// Pure state transition
    ///
    /// The returned row carries a bumped `version` when anything was written;
    /// an unchanged version means there is nothing to persist.
    pub fn transition(
        &self,
        input: LockInput,
        now: DateTime<Utc>,
        lease: Option<Duration>,
    ) -> (ProcessRow, Vec<Event>) {
        let mut next = self.clone();
        let mut events = Vec::new();

        match input {
            LockInput::Acquire { token, notes } => match self.holder() {
                None => {
                    next.grant(&token, notes.clone(), now);
                    events.push(Event::LockAcquired {
                        name: self.name.clone(),
                        token: token.0,
                        notes,
                    });
                }
                Some(current) if current == &token => {
                    // Already ours
                }
                Some(current) if self.is_stale(now, lease) => {
                    let previous = current.0.clone();
                    next.grant(&token, notes.clone(), now);
                    events.push(Event::LockReclaimed {
                        name: self.name.clone(),
                        previous,
                        token: token.0.clone(),
                    });
                    events.push(Event::LockAcquired {
                        name: self.name.clone(),
                        token: token.0,
                        notes,
                    });
                }
                Some(current) => {
                    events.push(Event::LockContested {
                        name: self.name.clone(),
                        token: token.0,
                        holder: current.0.clone(),
                    });
                }
            },

            LockInput::Release { token } => {
                if self.is_held_by(&token) {
                    next.clear(now);
                    events.push(Event::LockReleased {
                        name: self.name.clone(),
                        token: token.0,
                    });
                } else {
                    events.push(Event::LockProtocolViolation {
                        name: self.name.clone(),
                        token: token.0,
                        holder: self.holder().map(|h| h.0.clone()),
                    });
                }
            }

            LockInput::Heartbeat { token } => {
                if self.is_held_by(&token) {
                    next.heartbeat_at = Some(now);
                    next.touch(now);
                }
            }

            LockInput::ForceRelease { reason } => {
                if self.acquired {
                    let previous = self.token.as_ref().map(|t| t.0.clone());
                    next.clear(now);
                    next.error = Some(reason.clone());
                    events.push(Event::LockForceReleased {
                        name: self.name.clone(),
                        previous,
                        reason,
                    });
                }
            }
        }

        (next, events)
    }

    fn grant(&mut self, token: &LockToken, notes: Option<String>, now: DateTime<Utc>) {
        self.token = Some(token.clone());
        self.acquired = true;
        self.notes = notes;
        self.heartbeat_at = Some(now);
        self.touch(now);
    }

    fn clear(&mut self, now: DateTime<Utc>) {
        self.token = None;
        self.acquired = false;
        self.heartbeat_at = None;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
