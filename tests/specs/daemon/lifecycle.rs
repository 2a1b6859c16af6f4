// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle specs
//!
//! Verify statelyd startup, graceful shutdown, and hand-over between
//! daemons sharing one store.

use crate::prelude::*;

fn lock_held(temp: &Project) -> bool {
    temp.stately()
        .args(&["lock", "status", "state-dispatcher"])
        .passes()
        .stdout()
        .contains("held by")
}

#[test]
fn startup_marker_is_written_to_the_log() {
    let temp = Project::empty();
    let daemon = temp.statelyd();

    let log = std::fs::read_to_string(temp.log_path()).unwrap();
    assert!(log.starts_with("--- statelyd: starting (pid: "), "log: {log}");
    assert!(log.contains(&format!("(pid: {}) ---", daemon.pid())));
    daemon.terminate();
}

#[test]
fn sigterm_releases_the_dispatcher_lock() {
    let temp = Project::empty();
    let daemon = temp.statelyd();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || lock_held(&temp)));

    daemon.terminate();

    temp.stately()
        .args(&["lock", "status", "state-dispatcher"])
        .passes()
        .stdout_has("state-dispatcher: free");
}

#[test]
fn second_daemon_takes_over_after_the_first_stops() {
    let temp = Project::empty();
    let first = temp.statelyd();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || lock_held(&temp)));

    let first_holder = temp
        .stately()
        .args(&["--format", "json", "lock", "status", "state-dispatcher"])
        .passes()
        .json()["token"]
        .clone();

    let second = temp.statelyd();
    first.terminate();

    let taken_over = wait_for(SPEC_WAIT_MAX_MS, || {
        let status = temp
            .stately()
            .args(&["--format", "json", "lock", "status", "state-dispatcher"])
            .passes()
            .json();
        status["acquired"] == true && status["token"] != first_holder
    });
    assert!(taken_over, "second daemon never acquired the lock");
    second.terminate();
}

#[test]
fn invalid_config_fails_startup() {
    let temp = Project::empty();
    let config = temp.file("bad.toml", "[dispatcher]\nunknown_knob = 1\n");
    let bin = assert_cmd::cargo::cargo_bin("statelyd");
    let output = std::process::Command::new(bin)
        .arg(&config)
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("READY"));
}
