// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable storage
//!
//! One newline-terminated JSON entry per committed transaction. Several
//! processes append to the same file; callers must hold the store's
//! exclusive file lock around [`Wal::catch_up`] and [`Wal::append`].

use crate::error::StoreError;
use crate::operation::Operation;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A committed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Starts at 1 and increases by one per entry
    pub sequence: u64,
    pub operations: Vec<Operation>,
    /// CRC32 of the serialized operations
    pub checksum: u32,
}

impl WalEntry {
    pub fn new(sequence: u64, operations: Vec<Operation>) -> Result<Self, StoreError> {
        let checksum = checksum(&operations)?;
        Ok(Self {
            sequence,
            operations,
            checksum,
        })
    }

    pub fn verify(&self) -> bool {
        checksum(&self.operations).is_ok_and(|sum| sum == self.checksum)
    }

    pub fn to_line(&self) -> Result<String, StoreError> {
        serde_json::to_string(self).map_err(StoreError::from)
    }

    pub fn from_line(line: &str) -> Result<Self, StoreError> {
        serde_json::from_str(line).map_err(StoreError::from)
    }
}

fn checksum(operations: &[Operation]) -> Result<u32, StoreError> {
    let json = serde_json::to_string(operations)?;
    Ok(crc32fast::hash(json.as_bytes()))
}

/// Reader/appender over one WAL file, tracking how far it has read
#[derive(Debug)]
pub struct Wal {
    path: PathBuf,
    /// Byte offset just past the last complete entry read or written
    offset: u64,
    /// Lines consumed so far, for error messages
    lines: u64,
    next_sequence: u64,
}

impl Wal {
    /// A WAL at `path` that has not been read yet
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            offset: 0,
            lines: 0,
            next_sequence: 1,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sequence number of the last entry read or written (0 when empty)
    pub fn sequence(&self) -> u64 {
        self.next_sequence - 1
    }

    /// Read every complete entry appended since the last call
    ///
    /// A trailing line without its newline is a write that never finished;
    /// it is left unread. Any complete line that fails to parse or verify
    /// is corruption.
    pub fn catch_up(&mut self) -> Result<Vec<WalEntry>, StoreError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let mut entries = Vec::new();
        let mut consumed = 0usize;
        while let Some(end) = buf[consumed..].iter().position(|b| *b == b'\n') {
            let raw = &buf[consumed..consumed + end];
            let line_no = self.lines + 1;
            consumed += end + 1;

            let text = std::str::from_utf8(raw).map_err(|e| self.corrupted(line_no, e))?;
            if text.trim().is_empty() {
                self.lines = line_no;
                continue;
            }
            let entry = WalEntry::from_line(text).map_err(|e| self.corrupted(line_no, e))?;
            if !entry.verify() {
                return Err(self.corrupted(line_no, "checksum mismatch"));
            }
            if entry.sequence != self.next_sequence {
                return Err(self.corrupted(
                    line_no,
                    format!(
                        "expected sequence {}, found {}",
                        self.next_sequence, entry.sequence
                    ),
                ));
            }

            self.lines = line_no;
            self.next_sequence += 1;
            entries.push(entry);
        }

        self.offset += consumed as u64;
        Ok(entries)
    }

    /// Durably append one entry holding `operations`
    ///
    /// Must follow a [`Wal::catch_up`] under the same lock. A torn tail left
    /// by a crashed writer is cut off first so the new entry starts on a
    /// fresh line.
    pub fn append(&mut self, operations: Vec<Operation>) -> Result<WalEntry, StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.path)?;

        let len = file.metadata()?.len();
        if len > self.offset {
            tracing::warn!(
                path = %self.path.display(),
                bytes = len - self.offset,
                "discarding torn WAL tail"
            );
            file.set_len(self.offset)?;
        }

        let entry = WalEntry::new(self.next_sequence, operations)?;
        let mut line = entry.to_line()?;
        line.push('\n');

        file.seek(SeekFrom::Start(self.offset))?;
        file.write_all(line.as_bytes())?;
        // Critical: sync to ensure durability before returning
        file.sync_all()?;

        self.offset += line.len() as u64;
        self.lines += 1;
        self.next_sequence += 1;
        Ok(entry)
    }

    fn corrupted(&self, line: u64, reason: impl ToString) -> StoreError {
        StoreError::Corrupted {
            path: self.path.clone(),
            line,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
