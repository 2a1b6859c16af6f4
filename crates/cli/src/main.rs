// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! stately - operator CLI for state machines, the state log, and process locks

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod completions;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::definition::DefinitionCommand;
use commands::entity::EntityCommand;
use commands::lock::LockCommand;
use commands::log::LogCommand;
use commands::Context;
use std::path::{Path, PathBuf};

use crate::error::CliError;
use crate::output::OutputFormat;
use stately_core::StatelyConfig;

/// Config file used when neither --config nor STATELY_CONFIG is set
const DEFAULT_CONFIG: &str = "stately.toml";

#[derive(Parser)]
#[command(
    name = "stately",
    version,
    about = "Stately - state machines with an audited, dispatched state log"
)]
struct Cli {
    /// Store directory [env: STATELY_STORE]
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Config file [env: STATELY_CONFIG]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// State machine definitions
    Definition {
        #[command(subcommand)]
        command: DefinitionCommand,
    },
    /// Guarded row mutations
    Entity {
        #[command(subcommand)]
        command: EntityCommand,
    },
    /// State-log inspection and recovery
    Log {
        #[command(subcommand)]
        command: LogCommand,
    },
    /// Process locks
    Lock {
        #[command(subcommand)]
        command: LockCommand,
    },
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn main() {
    let cli = Cli::parse();
    setup_logging();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<CliError>() {
            Some(err) => eprint!("{}", err),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions(args) = cli.command {
        completions::generate_completions::<Cli>(args.shell);
        return Ok(());
    }

    let config = load_config(cli.config, cli.store)?;
    let ctx = Context::open(config, cli.format)?;

    match cli.command {
        Commands::Definition { command } => commands::definition::handle(&ctx, command),
        Commands::Entity { command } => commands::entity::handle(&ctx, command),
        Commands::Log { command } => commands::log::handle(&ctx, command),
        Commands::Lock { command } => commands::lock::handle(&ctx, command),
        Commands::Completions(_) => Ok(()),
    }
}

fn load_config(config: Option<PathBuf>, store: Option<PathBuf>) -> Result<StatelyConfig> {
    let explicit = config.or_else(|| std::env::var_os("STATELY_CONFIG").map(PathBuf::from));
    let mut config = match explicit {
        Some(path) => StatelyConfig::load(&path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => StatelyConfig::load(Path::new(DEFAULT_CONFIG))?,
        None => StatelyConfig::default(),
    };

    if let Some(store) = store.or_else(|| std::env::var_os("STATELY_STORE").map(PathBuf::from)) {
        config = config.with_store_path(store);
    }
    tracing::debug!(store = %config.store.path.display(), "loaded config");
    Ok(config)
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
