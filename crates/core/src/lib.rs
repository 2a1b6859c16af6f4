// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stately-core: pure domain types for stateful entities
//!
//! This crate provides:
//! - State machine definitions and the transition validator
//! - Row, state-log and process-lock records
//! - Actor metadata, clocks, lock tokens and configuration
//!
//! Nothing here performs I/O except [`config::StatelyConfig::load`].

pub mod actor;
pub mod clock;
pub mod config;
pub mod entity;
pub mod event;
pub mod host;
pub mod machine;
pub mod process;
pub mod state_log;
pub mod token;

// Re-exports
pub use actor::Actor;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    ConfigError, DaemonConfig, DefinitionsConfig, DispatcherConfig, StatelyConfig, StoreConfig,
};
pub use entity::{to_fields, Fields, NewRow, Row, RowUpdate, StateChange, Stateful};
pub use event::{Event, LogLevel};
pub use host::hostname;
pub use machine::{
    check_kind, validate_transition, DefinitionError, MachineKey, Movement,
    StateMachineDefinition, Transition, TransitionError, DEFAULT_KIND,
};
pub use process::{LockInput, ProcessRow};
pub use state_log::{NewStateLogEntry, StateLogEntry};
pub use token::{LockToken, ProcessTokenGen, SequentialTokenGen, TokenGen};
