// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::subscriber::FnSubscriber;
use chrono::Utc;
use stately_core::Actor;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn event() -> StateEvent {
    StateEvent {
        log_id: 42,
        entity_type: "order".to_string(),
        entity_id: 1,
        previous: Some("placed".to_string()),
        next: "paid".to_string(),
        actor: Actor::anonymous(),
        at: Utc::now(),
    }
}

#[test]
fn accepted_delivery_is_logged_with_span_fields() {
    let traced = TracedSubscriber::new(FnSubscriber::new("audit", |_: &StateEvent| {
        Delivery::Accept
    }));

    let (logs, result) = with_tracing(|| async { traced.deliver(&event()).await });

    assert_eq!(result, Delivery::Accept);
    assert!(logs.contains("subscriber.deliver"), "logs: {logs}");
    assert!(logs.contains("audit"), "logs: {logs}");
    assert!(logs.contains("log_id=42"), "logs: {logs}");
    assert!(logs.contains("accepted"), "logs: {logs}");
    assert!(logs.contains("elapsed_ms"), "logs: {logs}");
}

#[test]
fn rejection_is_logged_with_reason() {
    let traced = TracedSubscriber::new(FnSubscriber::new("mailer", |_: &StateEvent| {
        Delivery::Reject("smtp down".to_string())
    }));

    let (logs, result) = with_tracing(|| async { traced.deliver(&event()).await });

    assert_eq!(result, Delivery::Reject("smtp down".to_string()));
    assert!(logs.contains("WARN"), "logs: {logs}");
    assert!(logs.contains("smtp down"), "logs: {logs}");
}

#[test]
fn name_passes_through() {
    let traced = TracedSubscriber::new(FnSubscriber::new("audit", |_: &StateEvent| {
        Delivery::Accept
    }));
    assert_eq!(traced.name(), "audit");
}
