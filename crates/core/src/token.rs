// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock token generation
//!
//! A lock token identifies one holder of a named process lock. Tokens must
//! be unique across the fleet, so the production generator mixes the host
//! and pid into a random UUID; the sequential generator keeps tests
//! predictable.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque value identifying the current holder of a named lock
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockToken(pub String);

impl LockToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LockToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LockToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Generates lock tokens
pub trait TokenGen: Clone + Send + Sync {
    fn next(&self) -> LockToken;
}

/// Host/pid-qualified UUID tokens for production use
#[derive(Clone, Default)]
pub struct ProcessTokenGen;

impl TokenGen for ProcessTokenGen {
    fn next(&self) -> LockToken {
        LockToken(format!(
            "{}-{}-{}",
            crate::host::hostname(),
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        ))
    }
}

/// Sequential token generator for testing
#[derive(Clone)]
pub struct SequentialTokenGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialTokenGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialTokenGen {
    fn default() -> Self {
        Self::new("token")
    }
}

impl TokenGen for SequentialTokenGen {
    fn next(&self) -> LockToken {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        LockToken(format!("{}-{}", self.prefix, n))
    }
}
