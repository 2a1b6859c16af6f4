// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stateful entity rows
//!
//! Any entity type that owns a state machine declares it by implementing
//! [`Stateful`]. Rows carry the machine columns (`kind`, `machine_state`,
//! `stated_at`) next to an opaque bag of fields owned by the row-mutation
//! layer.

use crate::machine::DEFAULT_KIND;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque row columns outside the machine columns
pub type Fields = Map<String, Value>;

/// Capability marker for entity types that run a state machine
pub trait Stateful {
    /// Entity type name used to look up definitions and key log entries
    const ENTITY_TYPE: &'static str;

    /// Machine kind for entities with several machines
    fn machine_kind(&self) -> Option<&str> {
        None
    }
}

/// A stored entity row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: u64,
    pub kind: String,
    pub machine_state: Option<String>,
    /// Set whenever `machine_state` changes
    pub stated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fields: Fields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRow {
    /// Machine kind; the implicit kind when `None`
    pub kind: Option<String>,
    /// Explicit initial state; the definition's default when `None`
    pub state: Option<String>,
    pub fields: Fields,
}

impl NewRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn kind_or_default(&self) -> &str {
        self.kind.as_deref().unwrap_or(DEFAULT_KIND)
    }
}

/// Requested change to the machine state on update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StateChange {
    /// Leave the stored state alone
    #[default]
    Keep,
    /// Move to the given state
    Set(String),
    /// Set the state to null (only valid while still unstated)
    Clear,
}

/// Input for updating a row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowUpdate {
    /// Kind as supplied by the caller; must match the stored kind
    pub kind: Option<String>,
    pub state: StateChange,
    /// Fields merged over the stored ones
    pub fields: Fields,
}

impl RowUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_state(state: impl Into<String>) -> Self {
        Self {
            state: StateChange::Set(state.into()),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_state(mut self, state: StateChange) -> Self {
        self.state = state;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Serialize a typed entity into row fields
///
/// Non-object serializations are stored under a single `value` field.
pub fn to_fields<T: Serialize>(entity: &T) -> Result<Fields, serde_json::Error> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}
