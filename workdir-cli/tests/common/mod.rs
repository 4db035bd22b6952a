//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing:
//! - A temporary directory to run `workdir` in
//! - Command builders that point `workdir` at that directory
//! - File fixtures for `workdir.js` and `workdir.yml`

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with an isolated work directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Canonical path to the temporary directory
    pub temp_path: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new, empty test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp dir");

        Self {
            temp_dir,
            temp_path,
        }
    }

    /// Get a bare command builder without pre-configured flags.
    ///
    /// Variables that change how `workdir` behaves are cleared so the host
    /// environment cannot leak into tests.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("workdir").expect("Failed to find workdir binary");
        cmd.env_remove("WORKDIR_DIRECTORY")
            .env_remove("WORKDIR_RECURSION")
            .env_remove("WORKDIR_LOG_MODE");
        cmd
    }

    /// Get a command builder for this environment's directory.
    ///
    /// Only files in the directory itself are loaded, so nothing above the
    /// temp directory can interfere.
    pub fn command(&self) -> Command {
        self.command_in(".", 0)
    }

    /// Get a command builder for a subdirectory, searching `recursion`
    /// parent levels.
    pub fn command_in(&self, relative: &str, recursion: i32) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("-C")
            .arg(self.temp_path.join(relative))
            .arg("--recursion")
            .arg(recursion.to_string());
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Create a subdirectory in the test environment.
    pub fn create_dir(&self, name: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::create_dir_all(&path).expect("Failed to create test directory");
        path
    }

    /// Write a file relative to the temp directory, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.temp_path.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Write `workdir.js` in the temp directory.
    pub fn script(&self, content: &str) -> PathBuf {
        self.write("workdir.js", content)
    }

    /// Write `workdir.yml` in the temp directory.
    pub fn config(&self, content: &str) -> PathBuf {
        self.write("workdir.yml", content)
    }
}
