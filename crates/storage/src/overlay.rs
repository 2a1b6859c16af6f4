// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Uncommitted writes layered over materialized state
//!
//! Reads see the transaction's own writes. Nothing touches the base state
//! until the store commits the collected operations.

use crate::error::StoreError;
use crate::operation::Operation;
use crate::state::{self, MaterializedState, RowKey};
use crate::store::{RowDraft, Transaction};
use chrono::{DateTime, Utc};
use stately_core::{
    MachineKey, NewStateLogEntry, ProcessRow, Row, StateLogEntry, StateMachineDefinition,
};
use std::collections::BTreeMap;

pub(crate) struct Overlay<'a> {
    base: &'a MaterializedState,
    ops: Vec<Operation>,
    /// `None` marks a deletion
    definitions: BTreeMap<MachineKey, Option<StateMachineDefinition>>,
    rows: BTreeMap<RowKey, Row>,
    row_ids: BTreeMap<String, u64>,
    log: BTreeMap<u64, StateLogEntry>,
    processes: BTreeMap<String, ProcessRow>,
}

impl<'a> Overlay<'a> {
    pub(crate) fn new(base: &'a MaterializedState) -> Self {
        Self {
            base,
            ops: Vec::new(),
            definitions: BTreeMap::new(),
            rows: BTreeMap::new(),
            row_ids: BTreeMap::new(),
            log: BTreeMap::new(),
            processes: BTreeMap::new(),
        }
    }

    pub(crate) fn into_operations(self) -> Vec<Operation> {
        self.ops
    }

    /// Every log entry in id order, with staged versions taking precedence
    fn log_entries(&self) -> impl Iterator<Item = &StateLogEntry> + '_ {
        let base_last = self.base.last_log_id();
        self.base
            .state_log
            .iter()
            .map(move |(id, entry)| self.log.get(id).unwrap_or(entry))
            .chain(
                self.log
                    .range(base_last.saturating_add(1)..)
                    .map(|(_, entry)| entry),
            )
    }

    fn next_log_id(&self) -> u64 {
        let staged = self.log.keys().next_back().copied().unwrap_or(0);
        staged.max(self.base.last_log_id()) + 1
    }

    fn existing_entry(&self, id: u64) -> Result<StateLogEntry, StoreError> {
        self.log_entry(id)
            .ok_or_else(|| StoreError::not_found("state log entry", id))
    }
}

impl Transaction for Overlay<'_> {
    fn definition(&self, key: &MachineKey) -> Option<StateMachineDefinition> {
        match self.definitions.get(key) {
            Some(staged) => staged.clone(),
            None => self.base.definitions.get(key).cloned(),
        }
    }

    fn definitions(&self) -> Vec<StateMachineDefinition> {
        let mut merged = self.base.definitions.clone();
        for (key, staged) in &self.definitions {
            match staged {
                Some(def) => merged.insert(key.clone(), def.clone()),
                None => merged.remove(key),
            };
        }
        merged.into_values().collect()
    }

    fn put_definition(&mut self, definition: StateMachineDefinition) -> Result<(), StoreError> {
        definition.validate()?;
        self.ops.push(Operation::DefinitionPut {
            definition: definition.clone(),
        });
        self.definitions.insert(definition.key(), Some(definition));
        Ok(())
    }

    fn delete_definition(&mut self, key: &MachineKey) -> bool {
        if self.definition(key).is_none() {
            return false;
        }
        self.ops
            .push(Operation::DefinitionDelete { key: key.clone() });
        self.definitions.insert(key.clone(), None);
        true
    }

    fn row(&self, entity_type: &str, id: u64) -> Option<Row> {
        self.rows
            .get(&(entity_type.to_string(), id))
            .or_else(|| self.base.row(entity_type, id))
            .cloned()
    }

    fn insert_row(&mut self, entity_type: &str, draft: RowDraft) -> Row {
        let last = self
            .row_ids
            .get(entity_type)
            .copied()
            .unwrap_or_else(|| self.base.last_row_id(entity_type));
        let row = Row {
            id: last + 1,
            kind: draft.kind,
            machine_state: draft.machine_state,
            stated_at: draft.stated_at,
            fields: draft.fields,
            created_at: draft.created_at,
            updated_at: draft.created_at,
        };
        self.row_ids.insert(entity_type.to_string(), row.id);
        self.ops.push(Operation::RowPut {
            entity_type: entity_type.to_string(),
            row: row.clone(),
        });
        self.rows
            .insert((entity_type.to_string(), row.id), row.clone());
        row
    }

    fn update_row(&mut self, entity_type: &str, row: Row) -> Result<(), StoreError> {
        if self.row(entity_type, row.id).is_none() {
            return Err(StoreError::not_found("row", format!("{entity_type}/{}", row.id)));
        }
        self.ops.push(Operation::RowPut {
            entity_type: entity_type.to_string(),
            row: row.clone(),
        });
        self.rows.insert((entity_type.to_string(), row.id), row);
        Ok(())
    }

    fn append_log(&mut self, entry: NewStateLogEntry) -> u64 {
        let entry = StateLogEntry::from_new(self.next_log_id(), entry);
        let id = entry.id;
        self.ops.push(Operation::LogAppend {
            entry: entry.clone(),
        });
        self.log.insert(id, entry);
        id
    }

    fn log_entry(&self, id: u64) -> Option<StateLogEntry> {
        self.log
            .get(&id)
            .or_else(|| self.base.state_log.get(&id))
            .cloned()
    }

    fn pending(&self, limit: usize, now: DateTime<Utc>, max_attempts: u32) -> Vec<StateLogEntry> {
        self.log_entries()
            .filter(|e| e.is_due(now, max_attempts))
            .take(limit)
            .cloned()
            .collect()
    }

    fn parked(&self, max_attempts: u32) -> Vec<StateLogEntry> {
        self.log_entries()
            .filter(|e| e.is_parked(max_attempts))
            .cloned()
            .collect()
    }

    fn entries_for(&self, entity_type: &str, entity_id: u64) -> Vec<StateLogEntry> {
        self.log_entries()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .cloned()
            .collect()
    }

    fn mark_processed(&mut self, id: u64, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut entry = self.existing_entry(id)?;
        if entry.is_processed() {
            return Ok(false);
        }
        state::mark_processed(&mut entry, at);
        self.ops.push(Operation::LogProcessed { id, at });
        self.log.insert(id, entry);
        Ok(true)
    }

    fn mark_failed(
        &mut self,
        id: u64,
        at: DateTime<Utc>,
        retry_at: Option<DateTime<Utc>>,
        reason: &str,
    ) -> Result<StateLogEntry, StoreError> {
        let mut entry = self.existing_entry(id)?;
        if entry.is_processed() {
            return Ok(entry);
        }
        state::mark_failed(&mut entry, retry_at, reason);
        self.ops.push(Operation::LogFailed {
            id,
            at,
            retry_at,
            reason: reason.to_string(),
        });
        self.log.insert(id, entry.clone());
        Ok(entry)
    }

    fn requeue(&mut self, id: u64) -> Result<bool, StoreError> {
        let mut entry = self.existing_entry(id)?;
        if entry.is_processed() {
            return Ok(false);
        }
        state::requeue(&mut entry);
        self.ops.push(Operation::LogRequeue { id });
        self.log.insert(id, entry);
        Ok(true)
    }

    fn process(&self, name: &str) -> Option<ProcessRow> {
        self.processes
            .get(name)
            .or_else(|| self.base.processes.get(name))
            .cloned()
    }

    fn processes(&self) -> Vec<ProcessRow> {
        let mut merged = self.base.processes.clone();
        for (name, row) in &self.processes {
            merged.insert(name.clone(), row.clone());
        }
        merged.into_values().collect()
    }

    fn put_process(&mut self, process: ProcessRow) {
        self.ops.push(Operation::ProcessPut {
            process: process.clone(),
        });
        self.processes.insert(process.name.clone(), process);
    }
}

#[cfg(test)]
#[path = "overlay_tests.rs"]
mod tests;
