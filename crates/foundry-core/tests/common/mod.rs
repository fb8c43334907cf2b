//! A stand-in `docker` binary for driving the sandbox runner without Docker.
//!
//! `run` executes the entrypoint script (its last argument) with `sh`, where
//! `python` is a shell function with a scripted body. `rm` appends the
//! container name to a log file.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct FakeDocker {
    pub dir: TempDir,
    pub binary: PathBuf,
    removed_log: PathBuf,
}

impl FakeDocker {
    /// `python_body` must not contain double quotes
    pub fn new(python_body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("docker");
        let removed_log = dir.path().join("removed.log");

        let script = format!(
            r#"#!/bin/sh
case "$1" in
  rm)
    echo "$3" >> '{log}'
    ;;
  run)
    for last; do :; done
    exec sh -c "python() {{ {body}; }}
$last"
    ;;
esac
"#,
            log = removed_log.display(),
            body = python_body,
        );
        fs::write(&binary, script).unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();

        Self {
            dir,
            binary,
            removed_log,
        }
    }

    /// Reports one passing test
    pub fn passing() -> Self {
        Self::new("echo 'test_app.py::test_ok PASSED'; echo '1 passed in 0.01s'")
    }

    /// Never finishes on its own
    pub fn hanging() -> Self {
        Self::new("exec sleep 30")
    }

    pub fn binary(&self) -> String {
        self.binary.display().to_string()
    }

    /// Containers removed so far
    pub fn removed(&self) -> Vec<String> {
        fs::read_to_string(&self.removed_log)
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
