// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State machine definition and its structural validation

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Kind used when an entity does not run multiple machines
pub const DEFAULT_KIND: &str = "default";

/// Identity of a definition: one machine per (entity type, kind)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MachineKey {
    pub entity: String,
    pub kind: String,
}

impl MachineKey {
    pub fn new(entity: impl Into<String>, kind: Option<&str>) -> Self {
        Self {
            entity: entity.into(),
            kind: kind.unwrap_or(DEFAULT_KIND).to_string(),
        }
    }
}

impl fmt::Display for MachineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity, self.kind)
    }
}

/// A permitted (from, to) move for non-initial state changes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Movement {
    pub from: String,
    pub to: String,
}

impl Movement {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Structural problems with a definition, reported before it is stored
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("[entity] cannot be empty")]
    EmptyEntity,
    #[error("[states] cannot be empty")]
    NoStates,
    #[error("[states] cannot contain an empty state")]
    EmptyState,
    #[error("[states] {0} is listed more than once")]
    DuplicateState(String),
    #[error("[transitions] [{field}] cannot be empty")]
    EmptyMovement { field: &'static str },
    #[error("[transitions] [{field}]: {state} must be one of the defined states")]
    UnknownMovementState { field: &'static str, state: String },
    #[error("[entry_states]: {0} must be one of the defined states")]
    UnknownEntryState(String),
    #[error("[default_state]: {0} must be one of the defined states")]
    UnknownDefaultState(String),
    #[error("[default_state]: {0} must be one of the entry states")]
    DefaultNotEntry(String),
}

/// Legal states and moves for every entity of one type and kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMachineDefinition {
    pub entity: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub states: Vec<String>,
    /// States an entity may start in; `None` means any state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_states: Option<Vec<String>>,
    /// State assigned on creation when none is supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_state: Option<String>,
    /// Permitted moves; `None` allows any move between defined states
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitions: Option<Vec<Movement>>,
}

fn default_kind() -> String {
    DEFAULT_KIND.to_string()
}

impl StateMachineDefinition {
    pub fn new<I, S>(entity: impl Into<String>, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity: entity.into(),
            kind: DEFAULT_KIND.to_string(),
            states: states.into_iter().map(Into::into).collect(),
            entry_states: None,
            default_state: None,
            transitions: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_entry_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry_states = Some(states.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_default_state(mut self, state: impl Into<String>) -> Self {
        self.default_state = Some(state.into());
        self
    }

    pub fn with_transition(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.transitions
            .get_or_insert_with(Vec::new)
            .push(Movement::new(from, to));
        self
    }

    pub fn key(&self) -> MachineKey {
        MachineKey {
            entity: self.entity.clone(),
            kind: self.kind.clone(),
        }
    }

    pub fn has_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s == state)
    }

    /// Whether `state` may be assigned as an entity's very first state
    pub fn is_entry_state(&self, state: &str) -> bool {
        match &self.entry_states {
            Some(entry) => entry.iter().any(|s| s == state),
            None => self.has_state(state),
        }
    }

    /// Whether a move between two different states is permitted
    pub fn permits(&self, from: &str, to: &str) -> bool {
        match &self.transitions {
            Some(moves) => moves.iter().any(|m| m.from == from && m.to == to),
            None => self.has_state(from) && self.has_state(to),
        }
    }

    /// Check the definition is internally consistent
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.entity.is_empty() {
            return Err(DefinitionError::EmptyEntity);
        }
        if self.states.is_empty() {
            return Err(DefinitionError::NoStates);
        }

        let mut seen = HashSet::new();
        for state in &self.states {
            if state.is_empty() {
                return Err(DefinitionError::EmptyState);
            }
            if !seen.insert(state.as_str()) {
                return Err(DefinitionError::DuplicateState(state.clone()));
            }
        }

        for movement in self.transitions.iter().flatten() {
            self.validate_movement_end("from", &movement.from)?;
            self.validate_movement_end("to", &movement.to)?;
        }

        if let Some(entry) = &self.entry_states {
            if let Some(unknown) = entry.iter().find(|s| !self.has_state(s)) {
                return Err(DefinitionError::UnknownEntryState(unknown.clone()));
            }
        }

        if let Some(default) = &self.default_state {
            if !self.has_state(default) {
                return Err(DefinitionError::UnknownDefaultState(default.clone()));
            }
            if !self.is_entry_state(default) {
                return Err(DefinitionError::DefaultNotEntry(default.clone()));
            }
        }

        Ok(())
    }

    fn validate_movement_end(&self, field: &'static str, state: &str) -> Result<(), DefinitionError> {
        if state.is_empty() {
            return Err(DefinitionError::EmptyMovement { field });
        }
        if !self.has_state(state) {
            return Err(DefinitionError::UnknownMovementState {
                field,
                state: state.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
