// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transition validation
//!
//! Decides whether an entity may move from its stored state to a proposed
//! state under a definition. Pure: callers may use it to pre-check a
//! mutation before attempting the write.

use super::definition::{MachineKey, StateMachineDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An accepted state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transition {
    /// No state before or after
    Unstated,
    /// First assignment of a state
    Enter { to: String },
    /// Move between two different states
    Move { from: String, to: String },
    /// Proposed state equals the stored one
    Stay { state: String },
}

impl Transition {
    /// Whether this change is written to the state log
    pub fn is_recorded(&self) -> bool {
        matches!(self, Transition::Enter { .. } | Transition::Move { .. })
    }

    pub fn previous(&self) -> Option<&str> {
        match self {
            Transition::Unstated | Transition::Enter { .. } => None,
            Transition::Move { from, .. } => Some(from),
            Transition::Stay { state } => Some(state),
        }
    }

    pub fn next(&self) -> Option<&str> {
        match self {
            Transition::Unstated => None,
            Transition::Enter { to } | Transition::Move { to, .. } => Some(to),
            Transition::Stay { state } => Some(state),
        }
    }
}

/// Why a mutation was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no state machine defined for {0}")]
    MissingDefinition(MachineKey),
    #[error("{state} is not a valid entry state for {key}")]
    InvalidEntryState { key: MachineKey, state: String },
    #[error("transition {from} -> {to} is not permitted for {key}")]
    IllegalTransition {
        key: MachineKey,
        from: String,
        to: String,
    },
    #[error("{state} is not a state of {key}")]
    UnknownState { key: MachineKey, state: String },
    #[error("state {state} cannot be cleared once set")]
    CannotClearState { state: String },
    #[error("kind cannot change from {from} to {to}")]
    ImmutableKind { from: String, to: String },
}

impl TransitionError {
    /// Stable name of the violated rule
    pub fn code(&self) -> &'static str {
        match self {
            TransitionError::MissingDefinition(_) => "missing_definition",
            TransitionError::InvalidEntryState { .. } => "invalid_entry_state",
            TransitionError::IllegalTransition { .. } => "illegal_transition",
            TransitionError::UnknownState { .. } => "unknown_state",
            TransitionError::CannotClearState { .. } => "cannot_clear_state",
            TransitionError::ImmutableKind { .. } => "immutable_kind",
        }
    }
}

/// Validate a proposed state against the stored one
pub fn validate_transition(
    definition: &StateMachineDefinition,
    previous: Option<&str>,
    proposed: Option<&str>,
) -> Result<Transition, TransitionError> {
    let Some(proposed) = proposed else {
        return match previous {
            None => Ok(Transition::Unstated),
            Some(state) => Err(TransitionError::CannotClearState {
                state: state.to_string(),
            }),
        };
    };

    if !definition.has_state(proposed) {
        return Err(TransitionError::UnknownState {
            key: definition.key(),
            state: proposed.to_string(),
        });
    }

    match previous {
        None if definition.is_entry_state(proposed) => Ok(Transition::Enter {
            to: proposed.to_string(),
        }),
        None => Err(TransitionError::InvalidEntryState {
            key: definition.key(),
            state: proposed.to_string(),
        }),
        Some(current) if current == proposed => Ok(Transition::Stay {
            state: proposed.to_string(),
        }),
        Some(current) if definition.permits(current, proposed) => Ok(Transition::Move {
            from: current.to_string(),
            to: proposed.to_string(),
        }),
        Some(current) => Err(TransitionError::IllegalTransition {
            key: definition.key(),
            from: current.to_string(),
            to: proposed.to_string(),
        }),
    }
}

/// Reject any attempt to change an entity's kind after creation
pub fn check_kind(stored: &str, proposed: Option<&str>) -> Result<(), TransitionError> {
    match proposed {
        Some(kind) if kind != stored => Err(TransitionError::ImmutableKind {
            from: stored.to_string(),
            to: kind.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
