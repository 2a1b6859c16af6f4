// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use crate::operation::Operation;
use chrono::{DateTime, Utc};
use stately_core::{MachineKey, ProcessRow, Row, StateLogEntry, StateMachineDefinition};
use std::collections::BTreeMap;

/// Row identity: entity type plus per-type id
pub type RowKey = (String, u64);

/// Everything the store knows, rebuilt by replaying operations in order
#[derive(Debug, Default, Clone)]
pub struct MaterializedState {
    pub definitions: BTreeMap<MachineKey, StateMachineDefinition>,
    pub rows: BTreeMap<RowKey, Row>,
    /// Last id handed out per entity type
    pub row_ids: BTreeMap<String, u64>,
    pub state_log: BTreeMap<u64, StateLogEntry>,
    pub processes: BTreeMap<String, ProcessRow>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, entity_type: &str, id: u64) -> Option<&Row> {
        self.rows.get(&(entity_type.to_string(), id))
    }

    pub fn last_row_id(&self, entity_type: &str) -> u64 {
        self.row_ids.get(entity_type).copied().unwrap_or(0)
    }

    pub fn last_log_id(&self) -> u64 {
        self.state_log.keys().next_back().copied().unwrap_or(0)
    }

    /// Apply an operation to update the state
    ///
    /// Operations that reference a missing log entry are ignored; they can
    /// only come from a WAL written by a newer or buggy writer and replay
    /// must not stop on them.
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::DefinitionPut { definition } => {
                self.definitions.insert(definition.key(), definition.clone());
            }

            Operation::DefinitionDelete { key } => {
                self.definitions.remove(key);
            }

            Operation::RowPut { entity_type, row } => {
                let last = self.row_ids.entry(entity_type.clone()).or_insert(0);
                if row.id > *last {
                    *last = row.id;
                }
                self.rows.insert((entity_type.clone(), row.id), row.clone());
            }

            Operation::LogAppend { entry } => {
                self.state_log.insert(entry.id, entry.clone());
            }

            Operation::LogProcessed { id, at } => {
                if let Some(entry) = self.state_log.get_mut(id) {
                    mark_processed(entry, *at);
                }
            }

            Operation::LogFailed {
                id,
                at: _,
                retry_at,
                reason,
            } => {
                if let Some(entry) = self.state_log.get_mut(id) {
                    mark_failed(entry, *retry_at, reason);
                }
            }

            Operation::LogRequeue { id } => {
                if let Some(entry) = self.state_log.get_mut(id) {
                    requeue(entry);
                }
            }

            Operation::ProcessPut { process } => {
                self.processes.insert(process.name.clone(), process.clone());
            }
        }
    }
}

// Entry mutations shared by replay and the transaction overlay.

pub(crate) fn mark_processed(entry: &mut StateLogEntry, at: DateTime<Utc>) {
    if entry.processed_at.is_none() {
        entry.processed_at = Some(at);
        entry.retry_at = None;
    }
}

pub(crate) fn mark_failed(entry: &mut StateLogEntry, retry_at: Option<DateTime<Utc>>, reason: &str) {
    if entry.processed_at.is_none() {
        entry.error = true;
        entry.attempts += 1;
        entry.last_error = Some(reason.to_string());
        entry.retry_at = retry_at;
    }
}

pub(crate) fn requeue(entry: &mut StateLogEntry) {
    if entry.processed_at.is_none() {
        entry.attempts = 0;
        entry.retry_at = None;
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
