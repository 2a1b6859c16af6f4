// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity commands: guarded inserts and state changes

use super::{actor, Context};
use crate::error::CliError;
use crate::output;
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use stately_core::{NewRow, Row, RowUpdate, StateLogEntry};
use stately_engine::{Committed, GuardError};
use stately_storage::Store;
use std::fmt;

#[derive(Subcommand)]
pub enum EntityCommand {
    /// Create a row, taking the default state when --state is omitted
    Insert {
        entity_type: String,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        state: Option<String>,
        /// Field as key=value; values that parse as JSON are stored as JSON
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
        /// Extra actor attribute as key=value
        #[arg(long = "actor", value_parser = parse_field)]
        actor: Vec<(String, Value)>,
    },
    /// Move a row to a new state
    SetState {
        entity_type: String,
        id: u64,
        state: String,
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
        #[arg(long = "actor", value_parser = parse_field)]
        actor: Vec<(String, Value)>,
    },
    /// Show a row and its state history
    Show { entity_type: String, id: u64 },
}

#[derive(Serialize)]
struct CommittedView {
    entity_type: String,
    row: Row,
    log_id: Option<u64>,
}

impl fmt::Display for CommittedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.row.machine_state.as_deref().unwrap_or("-");
        write!(f, "{} {} [{}]", self.entity_type, self.row.id, state)?;
        match self.log_id {
            Some(id) => write!(f, " (log #{})", id),
            None => write!(f, " (unchanged)"),
        }
    }
}

#[derive(Serialize)]
struct RowView {
    entity_type: String,
    row: Row,
    history: Vec<StateLogEntry>,
}

impl fmt::Display for RowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = &self.row;
        writeln!(f, "{} {}", self.entity_type, row.id)?;
        writeln!(f, "  kind:  {}", row.kind)?;
        writeln!(
            f,
            "  state: {}",
            row.machine_state.as_deref().unwrap_or("-")
        )?;
        if let Some(at) = row.stated_at {
            writeln!(f, "  since: {}", at.format("%Y-%m-%d %H:%M:%S"))?;
        }
        for (key, value) in &row.fields {
            writeln!(f, "  {}: {}", key, value)?;
        }
        if !self.history.is_empty() {
            writeln!(f, "history:")?;
            for entry in &self.history {
                writeln!(f, "  {}", entry)?;
            }
        }
        Ok(())
    }
}

pub fn handle(ctx: &Context, command: EntityCommand) -> anyhow::Result<()> {
    match command {
        EntityCommand::Insert {
            entity_type,
            kind,
            state,
            fields,
            actor: extra,
        } => {
            let mut new = NewRow::new();
            if let Some(kind) = kind {
                new = new.with_kind(kind);
            }
            if let Some(state) = state {
                new = new.with_state(state);
            }
            for (key, value) in fields {
                new = new.with_field(key, value);
            }
            let committed = ctx
                .guard()
                .insert(&entity_type, new, actor_with(extra))
                .map_err(|e| guard_error(&entity_type, e))?;
            print_committed(ctx, entity_type, committed);
        }
        EntityCommand::SetState {
            entity_type,
            id,
            state,
            fields,
            actor: extra,
        } => {
            let mut update = RowUpdate::to_state(state);
            for (key, value) in fields {
                update = update.with_field(key, value);
            }
            let committed = ctx
                .guard()
                .update(&entity_type, id, update, actor_with(extra))
                .map_err(|e| guard_error(&entity_type, e))?;
            print_committed(ctx, entity_type, committed);
        }
        EntityCommand::Show { entity_type, id } => {
            let row = ctx
                .store
                .row(&entity_type, id)?
                .ok_or_else(|| CliError::row_not_found(&entity_type, id))?;
            let history = ctx.store.entries_for(&entity_type, id)?;
            output::print(
                &RowView {
                    entity_type,
                    row,
                    history,
                },
                ctx.format,
            );
        }
    }
    Ok(())
}

fn print_committed(ctx: &Context, entity_type: String, committed: Committed) {
    output::print(
        &CommittedView {
            entity_type,
            row: committed.row,
            log_id: committed.log_id,
        },
        ctx.format,
    );
}

fn actor_with(extra: Vec<(String, Value)>) -> stately_core::Actor {
    extra
        .into_iter()
        .fold(actor(), |actor, (key, value)| actor.with(key, value))
}

fn guard_error(entity_type: &str, error: GuardError) -> anyhow::Error {
    match error {
        GuardError::Rejected(e) => CliError::rejected(entity_type, &e).into(),
        GuardError::RowNotFound { entity_type, id } => {
            CliError::row_not_found(&entity_type, id).into()
        }
        other => other.into(),
    }
}

/// Parse `key=value`, keeping the value as JSON when it parses as JSON
fn parse_field(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
