// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guarded entity specs
//!
//! Verify inserts and state changes are validated against the stored
//! definition and that every accepted change is logged.

use crate::prelude::*;

#[test]
fn insert_takes_the_default_state() {
    let temp = Project::empty().with_doc_definition();
    temp.stately()
        .args(&["entity", "insert", "doc", "--field", "title=Draft"])
        .passes()
        .stdout_has("doc 1 [A] (log #1)");

    temp.stately()
        .args(&["entity", "show", "doc", "1"])
        .passes()
        .stdout_has("state: A")
        .stdout_has("title: \"Draft\"")
        .stdout_has("#1 doc/1 - -> A");
}

#[test]
fn legal_moves_are_recorded_in_order() {
    let temp = Project::empty().with_doc_definition();
    temp.stately().args(&["entity", "insert", "doc"]).passes();
    temp.stately()
        .args(&["entity", "set-state", "doc", "1", "B"])
        .passes()
        .stdout_has("doc 1 [B] (log #2)");
    temp.stately()
        .args(&["entity", "set-state", "doc", "1", "C"])
        .passes();

    temp.stately()
        .args(&["log", "history", "doc", "1"])
        .passes()
        .stdout_has("#2 doc/1 A -> B")
        .stdout_has("#3 doc/1 B -> C");
}

#[test]
fn illegal_move_is_rejected_with_the_rule() {
    let temp = Project::empty().with_doc_definition();
    temp.stately().args(&["entity", "insert", "doc"]).passes();

    temp.stately()
        .args(&["entity", "set-state", "doc", "1", "C"])
        .fails()
        .stderr_has("rejected: transition A -> C is not permitted for doc/default")
        .stderr_has("rule: illegal_transition")
        .stderr_has("stately definition show doc");

    temp.stately()
        .args(&["entity", "show", "doc", "1"])
        .passes()
        .stdout_has("state: A")
        .stdout_lacks("-> C");
}

#[test]
fn non_entry_state_is_rejected_on_insert() {
    let temp = Project::empty().with_doc_definition();
    temp.stately()
        .args(&["entity", "insert", "doc", "--state", "B"])
        .fails()
        .stderr_has("B is not a valid entry state for doc/default");
    temp.stately()
        .args(&["entity", "show", "doc", "1"])
        .fails()
        .stderr_has("doc 1 not found");
}

#[test]
fn same_state_is_not_logged() {
    let temp = Project::empty().with_doc_definition();
    temp.stately().args(&["entity", "insert", "doc"]).passes();
    temp.stately()
        .args(&["entity", "set-state", "doc", "1", "A"])
        .passes()
        .stdout_has("(unchanged)");
    temp.stately()
        .args(&["--format", "json", "log", "history", "doc", "1"])
        .passes()
        .stdout_has("\"id\": 1")
        .stdout_lacks("\"id\": 2");
}

#[test]
fn insert_without_definition_suggests_put() {
    let temp = Project::empty();
    temp.stately()
        .args(&["entity", "insert", "doc"])
        .fails()
        .stderr_has("no state machine defined for doc/default")
        .stderr_has("stately definition put");
}

#[test]
fn actor_attributes_are_recorded() {
    let temp = Project::empty().with_doc_definition();
    temp.stately()
        .args(&["entity", "insert", "doc", "--actor", "ticket=OPS-7"])
        .passes();
    let history = temp
        .stately()
        .args(&["--format", "json", "log", "history", "doc", "1"])
        .passes()
        .json();
    assert_eq!(history[0]["actor"]["script"], "stately");
    assert_eq!(history[0]["actor"]["ticket"], "OPS-7");
}
