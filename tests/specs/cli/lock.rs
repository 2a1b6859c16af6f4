// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process lock specs
//!
//! A daemon killed without a chance to release leaves its lock held; the
//! operator frees it with a forced release.

use crate::prelude::*;

#[test]
fn status_of_unknown_lock() {
    let temp = Project::empty();
    temp.stately()
        .args(&["lock", "status", "state-dispatcher"])
        .passes()
        .stdout_has("state-dispatcher: never acquired");
    temp.stately()
        .args(&["lock", "status"])
        .passes()
        .stdout_has("No locks");
}

#[test]
fn release_of_free_lock_is_a_no_op() {
    let temp = Project::empty();
    temp.stately()
        .args(&["lock", "release", "--force"])
        .passes()
        .stdout_has("state-dispatcher is not held");
}

#[test]
fn crashed_holder_keeps_the_lock_until_forced() {
    let temp = Project::empty();
    let daemon = temp.statelyd();
    let held = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.stately()
            .args(&["lock", "status", "state-dispatcher"])
            .passes()
            .stdout()
            .contains("held by")
    });
    assert!(held, "daemon never acquired the dispatcher lock");
    daemon.crash();

    temp.stately()
        .args(&["lock", "status", "state-dispatcher"])
        .passes()
        .stdout_has("held by")
        .stdout_has("notes:     host=");

    temp.stately()
        .args(&["lock", "release"])
        .fails()
        .stderr_has("lock 'state-dispatcher' is held by")
        .stderr_has("--force");

    temp.stately()
        .args(&["lock", "release", "--force", "--reason", "host died"])
        .passes()
        .stdout_has("released state-dispatcher");

    temp.stately()
        .args(&["lock", "status", "state-dispatcher"])
        .passes()
        .stdout_has("state-dispatcher: free")
        .stdout_has("error:     host died");
}
