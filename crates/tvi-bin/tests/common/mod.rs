#![allow(dead_code)] // Shared across many integration tests; each test binary uses a subset of helpers.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// A scratch directory with a config that keeps the log inside it.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("tvi.log");
        std::fs::write(
            dir.path().join("tvi.toml"),
            format!("[log]\nfilter = \"debug\"\nfile = {:?}\n", log.display().to_string()),
        )
        .unwrap();
        Self { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, text: &str) -> PathBuf {
        let p = self.path(name);
        std::fs::write(&p, text).unwrap();
        p
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).unwrap()
    }

    /// Run `tvi args...` with `keys` piped to stdin.
    pub fn run(&self, args: &[&str], keys: &str) -> Output {
        let mut child = Command::new(env!("CARGO_BIN_EXE_tvi"))
            .current_dir(self.dir.path())
            .env_remove("TVI_LOG")
            .arg("--config")
            .arg(self.path("tvi.toml"))
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        child.stdin.take().unwrap().write_all(keys.as_bytes()).unwrap();
        child.wait_with_output().unwrap()
    }
}

pub fn exists(p: &Path) -> bool {
    p.exists()
}
