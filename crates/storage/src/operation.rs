// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL operation types
//!
//! Every state change in the store is one of these operations. Operations
//! carry full values where possible so replay never depends on wall time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stately_core::{MachineKey, ProcessRow, Row, StateLogEntry, StateMachineDefinition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    // Definition operations
    DefinitionPut {
        definition: StateMachineDefinition,
    },
    DefinitionDelete {
        key: MachineKey,
    },

    // Row operations
    /// Insert or replace a row of the given entity type
    RowPut {
        entity_type: String,
        row: Row,
    },

    // State log operations
    LogAppend {
        entry: StateLogEntry,
    },
    LogProcessed {
        id: u64,
        at: DateTime<Utc>,
    },
    LogFailed {
        id: u64,
        at: DateTime<Utc>,
        retry_at: Option<DateTime<Utc>>,
        reason: String,
    },
    LogRequeue {
        id: u64,
    },

    // Process lock operations
    ProcessPut {
        process: ProcessRow,
    },
}

impl Operation {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Operation::DefinitionPut { .. } => "definition:put",
            Operation::DefinitionDelete { .. } => "definition:delete",
            Operation::RowPut { .. } => "row:put",
            Operation::LogAppend { .. } => "log:append",
            Operation::LogProcessed { .. } => "log:processed",
            Operation::LogFailed { .. } => "log:failed",
            Operation::LogRequeue { .. } => "log:requeue",
            Operation::ProcessPut { .. } => "process:put",
        }
    }
}
