//! Shared end-to-end test harness: an isolated store directory plus a
//! helper that drives the compiled `tq` binary.

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

pub struct Workspace {
    /// Kept alive so the temp directory isn't removed out from under `db`.
    #[allow(dead_code)]
    pub dir: TempDir,
    pub db: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let db = dir.path().join("tickets.db");
        let workspace = Self { dir, db };
        workspace.tq(["migrate"]).assert().success();
        workspace
    }

    pub fn tq<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::cargo_bin("tq").expect("tq binary");
        cmd.env("TICKET_DB", &self.db);
        cmd.arg("--db").arg(&self.db);
        cmd.args(args);
        cmd
    }
}
