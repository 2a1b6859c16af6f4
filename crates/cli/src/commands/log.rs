// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-log commands

use super::Context;
use crate::error::CliError;
use crate::output;
use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use stately_core::StateLogEntry;
use stately_storage::{Store, StoreError};
use std::fmt;

#[derive(Subcommand)]
pub enum LogCommand {
    /// Entries due for delivery
    Pending {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Entries that exhausted their delivery attempts
    Parked,
    /// State history of one row
    History { entity_type: String, id: u64 },
    /// Reset a parked or failing entry so it is delivered again
    Requeue { id: u64 },
}

#[derive(Serialize)]
#[serde(transparent)]
struct EntryView {
    entry: StateLogEntry,
    #[serde(skip)]
    max_attempts: u32,
}

impl fmt::Display for EntryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = &self.entry;
        write!(f, "{:<40} ", entry.to_string())?;
        if let Some(at) = entry.processed_at {
            return write!(f, "processed {}", at.format("%Y-%m-%d %H:%M:%S"));
        }
        let reason = entry.last_error.as_deref().unwrap_or("-");
        if entry.is_parked(self.max_attempts) {
            write!(f, "parked after {} attempts: {}", entry.attempts, reason)
        } else if entry.attempts > 0 {
            write!(f, "failed x{}: {}", entry.attempts, reason)
        } else {
            write!(f, "pending")
        }
    }
}

pub fn handle(ctx: &Context, command: LogCommand) -> anyhow::Result<()> {
    let max_attempts = ctx.config.dispatcher.max_attempts;
    let view = |entry: StateLogEntry| EntryView {
        entry,
        max_attempts,
    };

    match command {
        LogCommand::Pending { limit } => {
            let entries: Vec<_> = ctx
                .store
                .pending(limit, Utc::now(), max_attempts)?
                .into_iter()
                .map(view)
                .collect();
            output::print_list(&entries, ctx.format, "No pending entries");
        }
        LogCommand::Parked => {
            let entries: Vec<_> = ctx
                .store
                .parked(max_attempts)?
                .into_iter()
                .map(view)
                .collect();
            output::print_list(&entries, ctx.format, "No parked entries");
        }
        LogCommand::History { entity_type, id } => {
            let entries: Vec<_> = ctx
                .store
                .entries_for(&entity_type, id)?
                .into_iter()
                .map(view)
                .collect();
            output::print_list(&entries, ctx.format, "No history");
        }
        LogCommand::Requeue { id } => match ctx.store.requeue(id) {
            Ok(true) => println!("requeued #{}", id),
            Ok(false) => println!("#{} was already processed", id),
            Err(StoreError::NotFound { .. }) => {
                return Err(CliError::new(format!("state-log entry #{} not found", id))
                    .with_suggestion("List parked entries: stately log parked")
                    .into())
            }
            Err(e) => return Err(e.into()),
        },
    }
    Ok(())
}
