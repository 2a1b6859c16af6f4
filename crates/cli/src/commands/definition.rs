// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Definition commands

use super::Context;
use crate::error::CliError;
use crate::output;
use anyhow::Context as _;
use clap::Subcommand;
use serde::Serialize;
use stately_core::{MachineKey, StateMachineDefinition};
use stately_storage::{Store, StoreError};
use std::fmt;
use std::io::Read;

#[derive(Subcommand)]
pub enum DefinitionCommand {
    /// Store a definition, replacing any with the same entity and kind
    Put {
        /// JSON or TOML file, `-` for stdin, or inline JSON
        source: String,
    },
    /// Show one definition
    Show {
        entity: String,
        #[arg(long)]
        kind: Option<String>,
    },
    /// List stored definitions
    List,
    /// Delete a definition
    Delete {
        entity: String,
        #[arg(long)]
        kind: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(transparent)]
struct DefinitionView(StateMachineDefinition);

impl fmt::Display for DefinitionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let def = &self.0;
        writeln!(f, "{}", def.key())?;
        writeln!(f, "  states:      {}", def.states.join(", "))?;
        match &def.entry_states {
            Some(entry) => writeln!(f, "  entry:       {}", entry.join(", "))?,
            None => writeln!(f, "  entry:       (any)")?,
        }
        if let Some(default) = &def.default_state {
            writeln!(f, "  default:     {}", default)?;
        }
        match &def.transitions {
            Some(moves) => {
                let moves: Vec<_> = moves
                    .iter()
                    .map(|m| format!("{} -> {}", m.from, m.to))
                    .collect();
                write!(f, "  transitions: {}", moves.join(", "))
            }
            None => write!(f, "  transitions: (any)"),
        }
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct DefinitionLine(StateMachineDefinition);

impl fmt::Display for DefinitionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<30} {} states",
            self.0.key().to_string(),
            self.0.states.len()
        )
    }
}

pub fn handle(ctx: &Context, command: DefinitionCommand) -> anyhow::Result<()> {
    match command {
        DefinitionCommand::Put { source } => {
            let definition = parse(&source)?;
            let key = definition.key();
            match ctx.definitions().put(definition.clone()) {
                Ok(()) => {}
                Err(StoreError::InvalidDefinition(e)) => {
                    return Err(CliError::new(format!("invalid definition {}: {}", key, e)).into())
                }
                Err(e) => return Err(e.into()),
            }
            match ctx.format {
                output::OutputFormat::Text => println!("stored {}", key),
                output::OutputFormat::Json => output::print(&DefinitionView(definition), ctx.format),
            }
        }
        DefinitionCommand::Show { entity, kind } => {
            let key = MachineKey::new(entity, kind.as_deref());
            let definition = ctx
                .store
                .definition(&key)?
                .ok_or_else(|| CliError::definition_not_found(&key))?;
            output::print(&DefinitionView(definition), ctx.format);
        }
        DefinitionCommand::List => {
            let definitions: Vec<_> = ctx
                .store
                .definitions()?
                .into_iter()
                .map(DefinitionLine)
                .collect();
            output::print_list(&definitions, ctx.format, "No definitions");
        }
        DefinitionCommand::Delete { entity, kind } => {
            let key = MachineKey::new(entity, kind.as_deref());
            if !ctx.definitions().delete(&key)? {
                return Err(CliError::definition_not_found(&key).into());
            }
            println!("deleted {}", key);
        }
    }
    Ok(())
}

/// Read a definition from a file, stdin or an inline JSON document
fn parse(source: &str) -> anyhow::Result<StateMachineDefinition> {
    if source.trim_start().starts_with('{') {
        return serde_json::from_str(source).context("invalid definition JSON");
    }

    if source == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return serde_json::from_str(&content).context("invalid definition JSON on stdin");
    }

    let content =
        std::fs::read_to_string(source).with_context(|| format!("failed to read {}", source))?;
    if source.ends_with(".toml") {
        toml::from_str(&content).with_context(|| format!("invalid definition TOML in {}", source))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid definition JSON in {}", source))
    }
}
