// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use stately_core::Actor;

fn event(log_id: u64, next: &str) -> StateEvent {
    StateEvent {
        log_id,
        entity_type: "order".to_string(),
        entity_id: 3,
        previous: None,
        next: next.to_string(),
        actor: Actor::anonymous().with("user", "ops"),
        at: Utc::now(),
    }
}

#[tokio::test]
async fn appends_one_json_line_per_event() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("journal.jsonl");
    let journal = JournalSubscriber::open(&path).unwrap();

    assert_eq!(journal.deliver(&event(1, "placed")).await, Delivery::Accept);
    assert_eq!(journal.deliver(&event(2, "paid")).await, Delivery::Accept);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["log_id"], 1);
    assert_eq!(lines[1]["next"], "paid");
    assert_eq!(lines[1]["actor"]["user"], "ops");
}

#[tokio::test]
async fn reopening_keeps_existing_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.jsonl");

    JournalSubscriber::open(&path)
        .unwrap()
        .deliver(&event(1, "placed"))
        .await;
    JournalSubscriber::open(&path)
        .unwrap()
        .deliver(&event(2, "paid"))
        .await;

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);
}
