// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod definition;
pub mod entity;
pub mod lock;
pub mod log;

use crate::output::OutputFormat;
use stately_core::{Actor, StatelyConfig, SystemClock};
use stately_engine::{DefinitionCache, DistributedLock, StatefulGuard};
use stately_storage::WalStore;

/// What every command runs against
pub struct Context {
    pub config: StatelyConfig,
    pub store: WalStore,
    pub format: OutputFormat,
}

impl Context {
    pub fn open(config: StatelyConfig, format: OutputFormat) -> anyhow::Result<Self> {
        let store = WalStore::open(&config.store.path)?;
        Ok(Self {
            config,
            store,
            format,
        })
    }

    pub fn definitions(&self) -> DefinitionCache<WalStore, SystemClock> {
        DefinitionCache::new(
            self.store.clone(),
            SystemClock,
            self.config.definitions.cache_ttl,
        )
    }

    pub fn guard(&self) -> StatefulGuard<WalStore, SystemClock> {
        StatefulGuard::new(self.store.clone(), self.definitions(), SystemClock)
    }

    pub fn lock(&self) -> DistributedLock<WalStore, SystemClock> {
        DistributedLock::new(self.store.clone(), SystemClock).with_lease(self.config.dispatcher.lease)
    }
}

/// Actor recorded for mutations made from the command line
pub fn actor() -> Actor {
    let actor = Actor::process("stately");
    match std::env::var("USER") {
        Ok(user) => actor.with("user", user),
        Err(_) => actor,
    }
}
