// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events emitted by the process lock and the dispatcher

use serde::{Deserialize, Serialize};

/// Something observable happened to a lock or to a state-log entry.
///
/// Events are data: pure transitions return them, and the engine decides how
/// to surface them (see [`Event::level`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    // Lock events
    LockAcquired {
        name: String,
        token: String,
        notes: Option<String>,
    },
    /// Another holder owns the lock. Expected while a peer is running.
    LockContested {
        name: String,
        token: String,
        holder: String,
    },
    LockReleased {
        name: String,
        token: String,
    },
    /// A release or heartbeat arrived from a token that does not hold the lock.
    LockProtocolViolation {
        name: String,
        token: String,
        holder: Option<String>,
    },
    LockReclaimed {
        name: String,
        previous: String,
        token: String,
    },
    LockForceReleased {
        name: String,
        previous: Option<String>,
        reason: String,
    },

    // Dispatch events
    EntryDelivered {
        log_id: u64,
        subscribers: usize,
    },
    EntryFailed {
        log_id: u64,
        attempts: u32,
        reason: String,
    },
    EntryParked {
        log_id: u64,
        attempts: u32,
        reason: String,
    },
}

/// Severity an event should be logged at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::LockAcquired { .. } => "lock:acquired",
            Event::LockContested { .. } => "lock:contested",
            Event::LockReleased { .. } => "lock:released",
            Event::LockProtocolViolation { .. } => "lock:protocol_violation",
            Event::LockReclaimed { .. } => "lock:reclaimed",
            Event::LockForceReleased { .. } => "lock:force_released",
            Event::EntryDelivered { .. } => "entry:delivered",
            Event::EntryFailed { .. } => "entry:failed",
            Event::EntryParked { .. } => "entry:parked",
        }
    }

    pub fn level(&self) -> LogLevel {
        match self {
            Event::LockContested { .. } | Event::EntryDelivered { .. } => LogLevel::Debug,
            Event::LockAcquired { .. } | Event::LockReleased { .. } => LogLevel::Info,
            Event::LockProtocolViolation { .. }
            | Event::LockReclaimed { .. }
            | Event::LockForceReleased { .. }
            | Event::EntryFailed { .. } => LogLevel::Warn,
            Event::EntryParked { .. } => LogLevel::Error,
        }
    }

    /// Name of the lock this event concerns, if it is a lock event
    pub fn lock_name(&self) -> Option<&str> {
        match self {
            Event::LockAcquired { name, .. }
            | Event::LockContested { name, .. }
            | Event::LockReleased { name, .. }
            | Event::LockProtocolViolation { name, .. }
            | Event::LockReclaimed { name, .. }
            | Event::LockForceReleased { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::LockAcquired { name, token, .. } => write!(f, "{name} acquired by {token}"),
            Event::LockContested {
                name,
                token,
                holder,
            } => write!(f, "{name} held by {holder}, {token} denied"),
            Event::LockReleased { name, token } => write!(f, "{name} released by {token}"),
            Event::LockProtocolViolation {
                name,
                token,
                holder,
            } => match holder {
                Some(holder) => write!(f, "{name} held by {holder}, not {token}"),
                None => write!(f, "{name} is free, {token} does not hold it"),
            },
            Event::LockReclaimed {
                name,
                previous,
                token,
            } => write!(f, "{name} reclaimed from {previous} by {token}"),
            Event::LockForceReleased {
                name,
                previous,
                reason,
            } => match previous {
                Some(previous) => write!(f, "{name} force-released from {previous}: {reason}"),
                None => write!(f, "{name} force-released: {reason}"),
            },
            Event::EntryDelivered {
                log_id,
                subscribers,
            } => write!(f, "#{log_id} delivered to {subscribers} subscriber(s)"),
            Event::EntryFailed {
                log_id,
                attempts,
                reason,
            } => write!(f, "#{log_id} failed (attempt {attempts}): {reason}"),
            Event::EntryParked {
                log_id,
                attempts,
                reason,
            } => write!(f, "#{log_id} parked after {attempts} attempts: {reason}"),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
