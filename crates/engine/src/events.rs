// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Surfacing lock and dispatch events as structured logs

use stately_core::{Event, LogLevel};

/// Log an event at the severity it carries
pub fn log_event(event: &Event) {
    let name = event.name();
    match event.level() {
        LogLevel::Debug => tracing::debug!(event = name, "{event}"),
        LogLevel::Info => tracing::info!(event = name, "{event}"),
        LogLevel::Warn => tracing::warn!(event = name, "{event}"),
        LogLevel::Error => tracing::error!(event = name, "{event}"),
    }
}

pub(crate) fn log_events(events: &[Event]) {
    for event in events {
        log_event(event);
    }
}
