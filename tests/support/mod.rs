use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Epoch milliseconds for 2024-03-15T00:00:00Z (a Friday).
pub const FRI_MIDNIGHT_UTC: i64 = 1_710_460_800_000;
pub const SUN_WEEK_START_UTC: i64 = 1_710_028_800_000;
pub const SUN_WEEK_END_UTC: i64 = 1_710_633_600_000;
pub const MONTH_START_UTC: i64 = 1_709_251_200_000;
pub const MONTH_END_UTC: i64 = 1_711_929_600_000;
pub const DAY_MS: i64 = 86_400_000;

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel_path);
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn write_tasks(&self, contents: &str) -> PathBuf {
        self.write_file("tasks.json", contents)
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        self.write_file(".taskbucket.toml", contents)
    }

    /// A command running inside this workspace, with taskbucket env overrides cleared.
    pub fn cmd(&self) -> Command {
        let mut cmd = taskbucket_cmd();
        cmd.current_dir(self.path());
        cmd
    }
}

pub fn taskbucket_cmd() -> Command {
    let mut cmd = Command::cargo_bin("taskbucket").expect("binary");
    cmd.env_remove("TASKBUCKET_CONFIG")
        .env_remove("TASKBUCKET_TZ")
        .env_remove("RUST_LOG");
    cmd
}

pub fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

pub fn ids(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|task| task["id"].as_str().expect("id").to_string())
        .collect()
}
