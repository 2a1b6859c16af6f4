// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error types

use stately_core::DefinitionError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupted WAL {path} at line {line}: {reason}")]
    Corrupted {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("invalid definition: {0}")]
    InvalidDefinition(#[from] DefinitionError),
    #[error("not found: {kind} {id}")]
    NotFound { kind: &'static str, id: String },
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
