// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal subscriber: appends delivered state events to a JSON-lines file

use async_trait::async_trait;
use stately_engine::{Delivery, StateEvent, Subscriber};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct JournalSubscriber {
    path: PathBuf,
    file: Mutex<File>,
}

impl JournalSubscriber {
    /// Open `path` for appending, creating parent directories
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, event: &StateEvent) -> Result<(), String> {
        let mut line = serde_json::to_string(event).map_err(|e| e.to_string())?;
        line.push('\n');
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| format!("journal write failed: {e}"))
    }
}

#[async_trait]
impl Subscriber for JournalSubscriber {
    fn name(&self) -> &str {
        "journal"
    }

    async fn deliver(&self, event: &StateEvent) -> Delivery {
        match self.append(event) {
            Ok(()) => Delivery::Accept,
            Err(reason) => Delivery::Reject(reason),
        }
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
