//! Fake `docker` for session tests: `run` records the start, then sleeps
//! until killed; `rm` records the removed container.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct SleepingDocker {
    pub dir: TempDir,
    binary: PathBuf,
}

impl SleepingDocker {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("docker");
        let started = dir.path().join("started.log");
        let removed = dir.path().join("removed.log");

        let script = format!(
            r#"#!/bin/sh
case "$1" in
  rm)
    echo "$3" >> '{removed}'
    ;;
  run)
    echo "$4" >> '{started}'
    exec sleep 30
    ;;
esac
"#,
            removed = removed.display(),
            started = started.display(),
        );
        fs::write(&binary, script).unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir, binary }
    }

    pub fn binary(&self) -> String {
        self.binary.display().to_string()
    }

    pub fn started(&self) -> Vec<String> {
        lines(&self.dir.path().join("started.log"))
    }

    pub fn removed(&self) -> Vec<String> {
        lines(&self.dir.path().join("removed.log"))
    }
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|log| log.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
