// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL-backed store
//!
//! The store directory holds `wal.jsonl` and `store.lock`. Each transaction
//! takes an exclusive lock on `store.lock`, replays whatever other processes
//! appended since the last transaction, runs the closure, then appends the
//! collected operations as one fsync'd entry. The in-memory flavor skips the
//! disk steps.

use crate::error::StoreError;
use crate::overlay::Overlay;
use crate::state::MaterializedState;
use crate::store::{Store, Transaction};
use crate::wal::Wal;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const WAL_FILE: &str = "wal.jsonl";
pub const LOCK_FILE: &str = "store.lock";

#[derive(Clone)]
pub struct WalStore {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    state: MaterializedState,
    disk: Option<Disk>,
}

struct Disk {
    dir: PathBuf,
    lock_path: PathBuf,
    wal: Wal,
}

/// Exclusive advisory lock held for the duration of a transaction
struct FileLock(File);

impl FileLock {
    fn exclusive(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        file.lock_exclusive()?;
        Ok(Self(file))
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

impl Disk {
    /// Apply entries other writers appended since we last looked
    fn catch_up(&mut self, state: &mut MaterializedState) -> Result<(), StoreError> {
        let entries = self.wal.catch_up()?;
        if !entries.is_empty() {
            tracing::trace!(count = entries.len(), "replaying WAL entries");
        }
        for entry in entries {
            for op in &entry.operations {
                state.apply(op);
            }
        }
        Ok(())
    }
}

impl WalStore {
    /// Non-durable store for tests and tools
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: MaterializedState::new(),
                disk: None,
            })),
        }
    }

    /// Open or create a store directory and replay its WAL
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut disk = Disk {
            dir: dir.to_path_buf(),
            lock_path: dir.join(LOCK_FILE),
            wal: Wal::new(&dir.join(WAL_FILE)),
        };
        let mut state = MaterializedState::new();
        {
            let _lock = FileLock::exclusive(&disk.lock_path)?;
            disk.catch_up(&mut state)?;
        }
        tracing::debug!(
            path = %dir.display(),
            sequence = disk.wal.sequence(),
            "opened store"
        );

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                disk: Some(disk),
            })),
        })
    }

    /// Store directory; `None` for in-memory stores
    pub fn path(&self) -> Option<PathBuf> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.disk.as_ref().map(|d| d.dir.clone())
    }

    /// Sequence of the last WAL entry this handle has seen
    pub fn sequence(&self) -> u64 {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.disk.as_ref().map(|d| d.wal.sequence()).unwrap_or(0)
    }
}

impl Store for WalStore {
    fn transact<T, E>(
        &self,
        f: impl FnOnce(&mut dyn Transaction) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Inner { state, disk } = &mut *inner;

        let _lock = match disk.as_mut() {
            Some(disk) => {
                let lock = FileLock::exclusive(&disk.lock_path)?;
                disk.catch_up(state)?;
                Some(lock)
            }
            None => None,
        };

        let mut overlay = Overlay::new(state);
        let value = f(&mut overlay)?;
        let ops = overlay.into_operations();
        if ops.is_empty() {
            return Ok(value);
        }

        if let Some(disk) = disk.as_mut() {
            let entry = disk.wal.append(ops)?;
            for op in &entry.operations {
                state.apply(op);
            }
        } else {
            for op in &ops {
                state.apply(op);
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
#[path = "wal_store_tests.rs"]
mod tests;
