// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-log specs

use crate::prelude::*;

#[test]
fn committed_changes_are_pending_until_dispatched() {
    let temp = Project::empty().with_doc_definition();
    temp.stately().args(&["entity", "insert", "doc"]).passes();
    temp.stately()
        .args(&["entity", "set-state", "doc", "1", "B"])
        .passes();

    temp.stately()
        .args(&["log", "pending"])
        .passes()
        .stdout_has("#1 doc/1 - -> A")
        .stdout_has("#2 doc/1 A -> B")
        .stdout_has("pending");
}

#[test]
fn pending_respects_the_limit() {
    let temp = Project::empty().with_doc_definition();
    for _ in 0..3 {
        temp.stately().args(&["entity", "insert", "doc"]).passes();
    }
    let entries = temp
        .stately()
        .args(&["--format", "json", "log", "pending", "--limit", "2"])
        .passes()
        .json();
    assert_eq!(entries.as_array().unwrap().len(), 2);
    assert_eq!(entries[0]["id"], 1);
}

#[test]
fn parked_is_empty_on_a_fresh_store() {
    let temp = Project::empty();
    temp.stately()
        .args(&["log", "parked"])
        .passes()
        .stdout_has("No parked entries");
}

#[test]
fn requeue_of_unknown_entry_fails() {
    let temp = Project::empty();
    temp.stately()
        .args(&["log", "requeue", "42"])
        .fails()
        .stderr_has("state-log entry #42 not found");
}

#[test]
fn requeue_of_pending_entry_succeeds() {
    let temp = Project::empty().with_doc_definition();
    temp.stately().args(&["entity", "insert", "doc"]).passes();
    temp.stately()
        .args(&["log", "requeue", "1"])
        .passes()
        .stdout_has("requeued #1");
}
