// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Definition specs
//!
//! Verify definitions are validated on write and read back unchanged.

use crate::prelude::*;

#[test]
fn put_then_show_round_trips() {
    let temp = Project::empty();
    temp.stately()
        .args(&["definition", "put", DOC_DEFINITION])
        .passes()
        .stdout_has("stored doc/default");

    temp.stately()
        .args(&["definition", "show", "doc"])
        .passes()
        .stdout_eq(
            "doc/default
  states:      A, B, C
  entry:       A
  default:     A
  transitions: A -> B, B -> C, C -> A",
        );
}

#[test]
fn toml_files_are_accepted() {
    let temp = Project::empty();
    let path = temp.file(
        "machines/order.toml",
        r#"
entity = "order"
kind = "b2b"
states = ["placed", "paid"]
default_state = "placed"
"#,
    );

    temp.stately()
        .args(&["definition", "put", path.to_str().unwrap()])
        .passes();
    temp.stately()
        .args(&["definition", "show", "order", "--kind", "b2b"])
        .passes()
        .stdout_has("transitions: (any)");
}

#[test]
fn stdin_is_accepted() {
    let temp = Project::empty();
    temp.stately()
        .args(&["definition", "put", "-"])
        .stdin(DOC_DEFINITION)
        .passes();
    temp.stately()
        .args(&["definition", "list"])
        .passes()
        .stdout_has("doc/default");
}

#[test]
fn invalid_definition_is_rejected_and_not_stored() {
    let temp = Project::empty();
    temp.stately()
        .args(&[
            "definition",
            "put",
            r#"{"entity":"doc","states":["A"],"default_state":"Z"}"#,
        ])
        .fails()
        .stderr_has("invalid definition doc/default")
        .stderr_has("default_state");

    temp.stately()
        .args(&["definition", "list"])
        .passes()
        .stdout_has("No definitions");
}

#[test]
fn show_missing_definition_suggests_list() {
    let temp = Project::empty();
    temp.stately()
        .args(&["definition", "show", "ghost"])
        .fails()
        .stderr_has("no definition for ghost/default")
        .stderr_has("stately definition list");
}

#[test]
fn delete_removes_the_definition() {
    let temp = Project::empty().with_doc_definition();
    temp.stately()
        .args(&["definition", "delete", "doc"])
        .passes()
        .stdout_has("deleted doc/default");
    temp.stately()
        .args(&["definition", "show", "doc"])
        .fails();
}

#[test]
fn json_output_is_the_stored_definition() {
    let temp = Project::empty().with_doc_definition();
    let json = temp
        .stately()
        .args(&["--format", "json", "definition", "show", "doc"])
        .passes()
        .json();
    assert_eq!(json["entity"], "doc");
    assert_eq!(json["default_state"], "A");
    assert_eq!(json["transitions"].as_array().unwrap().len(), 3);
}
