// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch specs
//!
//! Verify that committed state changes reach the journal subscriber in
//! log order and are marked processed.

use crate::prelude::*;

#[test]
fn committed_changes_reach_the_journal_in_order() {
    let temp = Project::empty().with_doc_definition();
    let daemon = temp.statelyd();

    temp.stately().args(&["entity", "insert", "doc"]).passes();
    temp.stately()
        .args(&["entity", "set-state", "doc", "1", "B"])
        .passes();
    temp.stately()
        .args(&["entity", "set-state", "doc", "1", "C"])
        .passes();

    assert!(wait_for(SPEC_WAIT_MAX_MS, || temp.journal_lines().len() >= 3));
    let lines = temp.journal_lines();
    let moves: Vec<_> = lines
        .iter()
        .map(|l| (l["log_id"].as_u64().unwrap(), l["next"].as_str().unwrap().to_string()))
        .collect();
    assert_eq!(
        moves,
        vec![
            (1, "A".to_string()),
            (2, "B".to_string()),
            (3, "C".to_string())
        ]
    );
    assert_eq!(lines[1]["previous"], "A");
    assert_eq!(lines[0]["entity_type"], "doc");

    daemon.terminate();

    temp.stately()
        .args(&["log", "history", "doc", "1"])
        .passes()
        .stdout_has("processed")
        .stdout_lacks("pending");
}

#[test]
fn rejected_changes_never_reach_the_journal() {
    let temp = Project::empty().with_doc_definition();
    let daemon = temp.statelyd();

    temp.stately().args(&["entity", "insert", "doc"]).passes();
    temp.stately()
        .args(&["entity", "set-state", "doc", "1", "C"])
        .fails();

    assert!(wait_for(SPEC_WAIT_MAX_MS, || !temp.journal_lines().is_empty()));
    daemon.terminate();

    let lines = temp.journal_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["next"], "A");
}

#[test]
fn changes_made_while_no_daemon_runs_are_delivered_on_start() {
    let temp = Project::empty().with_doc_definition();
    temp.stately().args(&["entity", "insert", "doc"]).passes();
    temp.stately().args(&["entity", "insert", "doc"]).passes();

    let daemon = temp.statelyd();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || temp.journal_lines().len() >= 2));
    daemon.terminate();

    temp.stately()
        .args(&["log", "pending"])
        .passes()
        .stdout_has("No pending entries");
}
