// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store and transaction seams
//!
//! A [`Store`] runs closures against a [`Transaction`]. Everything a
//! closure writes is committed together when it returns `Ok`, and discarded
//! when it returns `Err`. The read helpers on [`Store`] are single-statement
//! transactions.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use stately_core::{
    MachineKey, NewStateLogEntry, ProcessRow, Row, StateLogEntry, StateMachineDefinition,
};

/// Row data the store turns into a [`Row`] by assigning an id
#[derive(Debug, Clone, PartialEq)]
pub struct RowDraft {
    pub kind: String,
    pub machine_state: Option<String>,
    pub stated_at: Option<DateTime<Utc>>,
    pub fields: stately_core::Fields,
    pub created_at: DateTime<Utc>,
}

/// Reads and writes inside one atomic unit
pub trait Transaction {
    // Definitions
    fn definition(&self, key: &MachineKey) -> Option<StateMachineDefinition>;
    fn definitions(&self) -> Vec<StateMachineDefinition>;
    /// Validates, then replaces any definition with the same key
    fn put_definition(&mut self, definition: StateMachineDefinition) -> Result<(), StoreError>;
    fn delete_definition(&mut self, key: &MachineKey) -> bool;

    // Rows
    fn row(&self, entity_type: &str, id: u64) -> Option<Row>;
    fn insert_row(&mut self, entity_type: &str, draft: RowDraft) -> Row;
    fn update_row(&mut self, entity_type: &str, row: Row) -> Result<(), StoreError>;

    // State log
    /// Appends and returns the assigned id
    fn append_log(&mut self, entry: NewStateLogEntry) -> u64;
    fn log_entry(&self, id: u64) -> Option<StateLogEntry>;
    /// Due, unprocessed, not parked entries, oldest first
    fn pending(&self, limit: usize, now: DateTime<Utc>, max_attempts: u32) -> Vec<StateLogEntry>;
    fn parked(&self, max_attempts: u32) -> Vec<StateLogEntry>;
    fn entries_for(&self, entity_type: &str, entity_id: u64) -> Vec<StateLogEntry>;
    /// Returns false when the entry was already processed
    fn mark_processed(&mut self, id: u64, at: DateTime<Utc>) -> Result<bool, StoreError>;
    /// Records a failed delivery and returns the updated entry
    fn mark_failed(
        &mut self,
        id: u64,
        at: DateTime<Utc>,
        retry_at: Option<DateTime<Utc>>,
        reason: &str,
    ) -> Result<StateLogEntry, StoreError>;
    /// Returns false when the entry was already processed
    fn requeue(&mut self, id: u64) -> Result<bool, StoreError>;

    // Process locks
    fn process(&self, name: &str) -> Option<ProcessRow>;
    fn processes(&self) -> Vec<ProcessRow>;
    fn put_process(&mut self, process: ProcessRow);
}

/// A transactional store shared between tasks and processes
pub trait Store: Clone + Send + Sync + 'static {
    /// Run `f` atomically
    fn transact<T, E>(
        &self,
        f: impl FnOnce(&mut dyn Transaction) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>;

    fn definition(&self, key: &MachineKey) -> Result<Option<StateMachineDefinition>, StoreError> {
        self.transact(|tx| Ok(tx.definition(key)))
    }

    fn definitions(&self) -> Result<Vec<StateMachineDefinition>, StoreError> {
        self.transact(|tx| Ok(tx.definitions()))
    }

    fn put_definition(&self, definition: StateMachineDefinition) -> Result<(), StoreError> {
        self.transact(|tx| tx.put_definition(definition))
    }

    fn delete_definition(&self, key: &MachineKey) -> Result<bool, StoreError> {
        self.transact(|tx| Ok(tx.delete_definition(key)))
    }

    fn row(&self, entity_type: &str, id: u64) -> Result<Option<Row>, StoreError> {
        self.transact(|tx| Ok(tx.row(entity_type, id)))
    }

    fn state_log_entry(&self, id: u64) -> Result<Option<StateLogEntry>, StoreError> {
        self.transact(|tx| Ok(tx.log_entry(id)))
    }

    fn pending(
        &self,
        limit: usize,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Vec<StateLogEntry>, StoreError> {
        self.transact(|tx| Ok(tx.pending(limit, now, max_attempts)))
    }

    fn parked(&self, max_attempts: u32) -> Result<Vec<StateLogEntry>, StoreError> {
        self.transact(|tx| Ok(tx.parked(max_attempts)))
    }

    fn entries_for(&self, entity_type: &str, entity_id: u64) -> Result<Vec<StateLogEntry>, StoreError> {
        self.transact(|tx| Ok(tx.entries_for(entity_type, entity_id)))
    }

    fn mark_processed(&self, id: u64, at: DateTime<Utc>) -> Result<bool, StoreError> {
        self.transact(|tx| tx.mark_processed(id, at))
    }

    fn mark_failed(
        &self,
        id: u64,
        at: DateTime<Utc>,
        retry_at: Option<DateTime<Utc>>,
        reason: &str,
    ) -> Result<StateLogEntry, StoreError> {
        self.transact(|tx| tx.mark_failed(id, at, retry_at, reason))
    }

    fn requeue(&self, id: u64) -> Result<bool, StoreError> {
        self.transact(|tx| tx.requeue(id))
    }

    fn process(&self, name: &str) -> Result<Option<ProcessRow>, StoreError> {
        self.transact(|tx| Ok(tx.process(name)))
    }

    fn processes(&self) -> Result<Vec<ProcessRow>, StoreError> {
        self.transact(|tx| Ok(tx.processes()))
    }
}
