// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State machine definitions and transition validation
//!
//! This module provides:
//! - **StateMachineDefinition** - Legal states, entry states, default state and
//!   permitted moves for one (entity type, kind)
//! - **validate_transition** - Pure accept/reject decision for a proposed state

mod definition;
mod transition;

pub use definition::{DefinitionError, MachineKey, Movement, StateMachineDefinition, DEFAULT_KIND};
pub use transition::{check_kind, validate_transition, Transition, TransitionError};
