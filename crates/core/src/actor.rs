// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Actor metadata: the "who" behind a mutation
//!
//! Stored verbatim on every state log entry. The contents are opaque to the
//! core; request handlers typically record remote address and user, while
//! background scripts record their name, host and pid.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque description of who performed a mutation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(Map<String, Value>);

impl Actor {
    /// Actor with no metadata
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Actor for internal bookkeeping performed by the library itself
    pub fn system() -> Self {
        Self::anonymous().with("system", "stately")
    }

    /// Actor for a background script running on this host
    pub fn process(script: impl Into<String>) -> Self {
        Self::anonymous()
            .with("script", script.into())
            .with("hostname", crate::host::hostname())
            .with("pid", std::process::id())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Actor {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
