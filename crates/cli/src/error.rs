// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use stately_core::{MachineKey, ProcessRow, TransitionError};
use std::fmt;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// A mutation refused by the state machine
    pub fn rejected(entity_type: &str, error: &TransitionError) -> Self {
        let show = format!("stately definition show {}", entity_type);
        let err = CliError::new(format!("rejected: {}", error))
            .with_context(format!("rule: {}", error.code()));
        match error {
            TransitionError::MissingDefinition(key) => err.with_suggestion(format!(
                "Store a definition first: stately definition put <file> (for {})",
                key
            )),
            TransitionError::ImmutableKind { .. } => {
                err.with_context("The kind of a row is fixed when it is created")
            }
            TransitionError::CannotClearState { .. } => {
                err.with_context("A row that has a state always keeps one")
            }
            _ => err.with_suggestion(format!("Show permitted states and moves: {}", show)),
        }
    }

    pub fn definition_not_found(key: &MachineKey) -> Self {
        CliError::new(format!("no definition for {}", key))
            .with_suggestion("List stored definitions: stately definition list")
    }

    pub fn row_not_found(entity_type: &str, id: u64) -> Self {
        CliError::new(format!("{} {} not found", entity_type, id))
    }

    /// Force-release attempted without `--force`
    pub fn lock_held(process: &ProcessRow, age: Option<String>) -> Self {
        let holder = process
            .holder()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut err = CliError::new(format!("lock '{}' is held by '{}'", process.name, holder));
        if let Some(age) = age {
            err = err.with_context(format!("Last heartbeat {} ago", age));
        }
        err.with_suggestion("Wait for the holder to release it")
            .with_suggestion(format!(
                "If the holder has died: stately lock release {} --force --reason <why>",
                process.name
            ))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {}
