// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process lock commands

use super::Context;
use crate::error::CliError;
use crate::output::{self, OutputFormat};
use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use stately_core::ProcessRow;
use stately_storage::Store;
use std::fmt;

#[derive(Subcommand)]
pub enum LockCommand {
    /// Show who holds a lock (all locks when no name is given)
    Status { name: Option<String> },
    /// Release a lock whose holder is gone
    Release {
        /// Defaults to the dispatcher lock
        name: Option<String>,
        /// Required: releasing bypasses the holder's token
        #[arg(long)]
        force: bool,
        #[arg(long, default_value = "released by operator")]
        reason: String,
    },
}

#[derive(Serialize)]
struct LockView {
    #[serde(flatten)]
    process: ProcessRow,
    heartbeat_age_secs: Option<u64>,
}

impl LockView {
    fn new(process: ProcessRow) -> Self {
        let heartbeat_age_secs = process.heartbeat_age(Utc::now()).map(|d| d.as_secs());
        Self {
            process,
            heartbeat_age_secs,
        }
    }
}

impl fmt::Display for LockView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.process;
        match p.holder() {
            Some(token) => write!(f, "{}: held by {}", p.name, token)?,
            None => write!(f, "{}: free", p.name)?,
        }
        write!(f, " (version {})", p.version)?;
        if let Some(notes) = &p.notes {
            write!(f, "\n  notes:     {}", notes)?;
        }
        if let Some(age) = self.heartbeat_age_secs {
            let age = output::age(std::time::Duration::from_secs(age));
            write!(f, "\n  heartbeat: {} ago", age)?;
        }
        if let Some(error) = &p.error {
            write!(f, "\n  error:     {}", error)?;
        }
        Ok(())
    }
}

pub fn handle(ctx: &Context, command: LockCommand) -> anyhow::Result<()> {
    let default_name = || ctx.config.dispatcher.lock_name.clone();

    match command {
        LockCommand::Status { name: Some(name) } => match ctx.lock().status(&name)? {
            Some(process) => output::print(&LockView::new(process), ctx.format),
            None => match ctx.format {
                OutputFormat::Text => println!("{}: never acquired", name),
                OutputFormat::Json => println!("null"),
            },
        },
        LockCommand::Status { name: None } => {
            let locks: Vec<_> = ctx
                .store
                .processes()?
                .into_iter()
                .map(LockView::new)
                .collect();
            output::print_list(&locks, ctx.format, "No locks");
        }
        LockCommand::Release {
            name,
            force,
            reason,
        } => {
            let name = name.unwrap_or_else(default_name);
            let lock = ctx.lock();
            let Some(process) = lock.status(&name)?.filter(|p| !p.is_free()) else {
                println!("{} is not held", name);
                return Ok(());
            };

            if !force {
                let age = process.heartbeat_age(Utc::now()).map(output::age);
                return Err(CliError::lock_held(&process, age).into());
            }

            if lock.force_release(&name, &reason)? {
                let holder = process.holder().map(|t| t.to_string()).unwrap_or_default();
                println!("released {} (was held by {})", name, holder);
            } else {
                println!("{} is not held", name);
            }
        }
    }
    Ok(())
}
