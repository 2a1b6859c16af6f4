// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State log entries
//!
//! One entry per accepted state change, including the initial assignment.
//! Entries are immutable apart from delivery bookkeeping: the dispatcher
//! stamps `processed_at` once every subscriber accepted, or records a failed
//! attempt and a retry gate.

use crate::actor::Actor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An entry waiting to be appended; the store assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStateLogEntry {
    pub entity_type: String,
    pub entity_id: u64,
    pub old_state: Option<String>,
    pub new_state: String,
    pub actor: Actor,
    pub created_at: DateTime<Utc>,
}

/// A recorded state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateLogEntry {
    /// Monotonically increasing insertion order
    pub id: u64,
    pub entity_type: String,
    pub entity_id: u64,
    pub old_state: Option<String>,
    pub new_state: String,
    pub actor: Actor,
    pub created_at: DateTime<Utc>,
    /// `None` until every invoked subscriber accepted the entry
    pub processed_at: Option<DateTime<Utc>>,
    /// At least one delivery attempt failed
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    /// Not eligible for delivery before this time
    #[serde(default)]
    pub retry_at: Option<DateTime<Utc>>,
}

impl StateLogEntry {
    pub fn from_new(id: u64, entry: NewStateLogEntry) -> Self {
        Self {
            id,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            old_state: entry.old_state,
            new_state: entry.new_state,
            actor: entry.actor,
            created_at: entry.created_at,
            processed_at: None,
            error: false,
            attempts: 0,
            last_error: None,
            retry_at: None,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }

    /// Failed often enough that it waits for an operator
    pub fn is_parked(&self, max_attempts: u32) -> bool {
        !self.is_processed() && self.attempts >= max_attempts
    }

    /// Eligible for the next dispatch pass
    pub fn is_due(&self, now: DateTime<Utc>, max_attempts: u32) -> bool {
        !self.is_processed()
            && !self.is_parked(max_attempts)
            && self.retry_at.map_or(true, |at| at <= now)
    }

    /// Event name used for subscription matching: `entity:new_state`
    pub fn event_name(&self) -> String {
        format!("{}:{}", self.entity_type, self.new_state)
    }
}

impl fmt::Display for StateLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {}/{} {} -> {}",
            self.id,
            self.entity_type,
            self.entity_id,
            self.old_state.as_deref().unwrap_or("-"),
            self.new_state
        )
    }
}

#[cfg(test)]
#[path = "state_log_tests.rs"]
mod tests;
