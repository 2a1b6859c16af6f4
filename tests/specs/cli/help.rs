// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and completion specs

use crate::prelude::*;

#[test]
fn help_lists_command_groups() {
    let temp = Project::empty();
    let run = temp.stately().args(&["--help"]).passes();
    for group in ["definition", "entity", "log", "lock", "completions"] {
        assert!(run.stdout().contains(group), "missing {group}");
    }
}

#[test]
fn completions_do_not_need_a_store() {
    let temp = Project::empty();
    temp.stately()
        .args(&["completions", "bash"])
        .passes()
        .stdout_has("stately");
    assert!(!temp.store_path().exists());
}

#[test]
fn unknown_subcommand_fails() {
    let temp = Project::empty();
    temp.stately()
        .args(&["frobnicate"])
        .fails()
        .stderr_has("unrecognized subcommand");
}

#[test]
fn rust_log_turns_on_diagnostics_on_stderr() {
    let temp = Project::empty();
    temp.stately()
        .args(&["lock", "status"])
        .passes()
        .stderr_lacks("loaded config");

    temp.stately()
        .env("RUST_LOG", "stately=debug")
        .args(&["lock", "status"])
        .passes()
        .stdout_has("No locks")
        .stderr_has("loaded config")
        .stderr_has(&temp.store_path().display().to_string());
}
