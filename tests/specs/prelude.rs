// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for black-box specs
//!
//! Every spec runs in its own temp directory with an isolated store, so
//! specs never see each other's definitions, rows, or locks.

#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::time::{Duration, Instant};

/// Upper bound for polling waits
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Three-state document machine with a default state
pub const DOC_DEFINITION: &str = r#"{
  "entity": "doc",
  "states": ["A", "B", "C"],
  "entry_states": ["A"],
  "default_state": "A",
  "transitions": [{"from": "A", "to": "B"}, {"from": "B", "to": "C"}, {"from": "C", "to": "A"}]
}"#;

pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.path().join("store")
    }

    pub fn log_path(&self) -> PathBuf {
        self.path().join("statelyd.log")
    }

    pub fn journal_path(&self) -> PathBuf {
        self.path().join("journal.jsonl")
    }

    /// Write a file relative to the project root
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// `stately` against this project's store
    pub fn stately(&self) -> CliBuilder {
        let mut cmd = Command::cargo_bin("stately").unwrap();
        cmd.current_dir(self.path())
            .env("STATELY_STORE", self.store_path())
            .env_remove("STATELY_CONFIG")
            .env_remove("RUST_LOG");
        CliBuilder { cmd }
    }

    /// Store the document machine
    pub fn with_doc_definition(self) -> Self {
        self.stately()
            .args(&["definition", "put", DOC_DEFINITION])
            .passes();
        self
    }

    /// Config for a fast-polling daemon writing to this project's journal
    pub fn daemon_config(&self) -> PathBuf {
        let config = format!(
            r#"
[store]
path = "{store}"

[dispatcher]
poll_interval = "20ms"
acquire_backoff = "50ms"
heartbeat_interval = "100ms"
retry_backoff = "100ms"

[daemon]
journal_path = "{journal}"
log_path = "{log}"
"#,
            store = self.store_path().display(),
            journal = self.journal_path().display(),
            log = self.log_path().display(),
        );
        self.file("stately.toml", &config)
    }

    /// Start `statelyd` and wait for its READY line
    pub fn statelyd(&self) -> Daemon {
        let config = self.daemon_config();
        let bin = assert_cmd::cargo::cargo_bin("statelyd");
        let mut child = std::process::Command::new(bin)
            .arg(&config)
            .current_dir(self.path())
            .env_remove("STATELY_STORE")
            .env("RUST_LOG", "info")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        let stdout = child.stdout.take().unwrap();
        let mut line = String::new();
        BufReader::new(stdout).read_line(&mut line).unwrap();
        assert_eq!(line.trim(), "READY", "statelyd did not report ready");
        Daemon { child }
    }

    pub fn journal_lines(&self) -> Vec<serde_json::Value> {
        std::fs::read_to_string(self.journal_path())
            .unwrap_or_default()
            .lines()
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.cmd.write_stdin(input.to_string());
        self
    }

    pub fn passes(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert { output };
        assert!(
            run.output.status.success(),
            "expected success\nstdout:\n{}\nstderr:\n{}",
            run.stdout(),
            run.stderr()
        );
        run
    }

    pub fn fails(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert { output };
        assert!(
            !run.output.status.success(),
            "expected failure\nstdout:\n{}",
            run.stdout()
        );
        run
    }
}

pub struct RunAssert {
    output: std::process::Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout()).unwrap()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            predicate::str::contains(expected).eval(stdout.as_str()),
            "stdout missing {expected:?}\nstdout:\n{stdout}"
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            predicate::str::contains(unexpected).not().eval(stdout.as_str()),
            "stdout has {unexpected:?}\nstdout:\n{stdout}"
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            predicate::str::contains(expected).eval(stderr.as_str()),
            "stderr missing {expected:?}\nstderr:\n{stderr}"
        );
        self
    }

    pub fn stderr_lacks(self, unexpected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            predicate::str::contains(unexpected).not().eval(stderr.as_str()),
            "stderr has {unexpected:?}\nstderr:\n{stderr}"
        );
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout().trim_end(), expected.trim_end());
        self
    }
}

/// A running `statelyd`; killed on drop
pub struct Daemon {
    child: Child,
}

impl Daemon {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Send SIGTERM and wait for a clean exit
    pub fn terminate(mut self) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        kill(Pid::from_raw(self.child.id() as i32), Signal::SIGTERM).unwrap();
        let status = self.child.wait().unwrap();
        assert!(status.success(), "statelyd exited with {status}");
    }

    /// Kill without letting the daemon release its lock
    pub fn crash(mut self) {
        self.child.kill().unwrap();
        self.child.wait().unwrap();
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Poll `condition` until it holds or `max_ms` elapses
pub fn wait_for(max_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    condition()
}
