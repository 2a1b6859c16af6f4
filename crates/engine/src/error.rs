// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use stately_core::TransitionError;
use stately_storage::StoreError;
use thiserror::Error;

/// Errors from guarded mutations
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("{0}")]
    Rejected(#[from] TransitionError),
    #[error("{entity_type} {id} not found")]
    RowNotFound { entity_type: String, id: u64 },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to serialize entity: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl GuardError {
    /// The violated rule, when the mutation was refused by the validator
    pub fn rejection(&self) -> Option<&TransitionError> {
        match self {
            GuardError::Rejected(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors from the dispatcher
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("dispatcher task failed: {0}")]
    Join(String),
    #[error("lock {0} is no longer held by this dispatcher")]
    LockLost(String),
}
