#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Isolated store + config directory for driving the binary
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    /// Fresh board with an empty (all-defaults) config file
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let board = Self { dir };
        board.write_config("").expect("failed to write config");
        board
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("storage.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("tabboard.toml")
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.config_path();
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_store(&self, value: &Value) -> std::io::Result<()> {
        fs::write(self.store_path(), serde_json::to_string_pretty(value)?)
    }

    pub fn read_store(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(self.store_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn stored_todos(&self) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
        let store = self.read_store()?;
        Ok(store["todos"].as_array().cloned().unwrap_or_default())
    }

    /// `tabboard` pointed at this board with the clock pinned to `now`
    pub fn cmd(&self, now: &str) -> Command {
        let mut cmd = tabboard_cmd();
        cmd.env("TABBOARD_STORE", self.store_path())
            .env("TABBOARD_CONFIG", self.config_path())
            .env("TABBOARD_NOW", now)
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run with `--json` and return the `data` member of the envelope
    pub fn json(&self, now: &str, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
        let output = self.cmd(now).args(args).arg("--json").output()?;
        if !output.status.success() {
            return Err(format!(
                "tabboard {:?} failed: {}{}",
                args,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )
            .into());
        }
        let envelope: Value = serde_json::from_slice(&output.stdout)?;
        Ok(envelope["data"].clone())
    }
}

pub fn tabboard_cmd() -> Command {
    Command::cargo_bin("tabboard").expect("binary")
}
