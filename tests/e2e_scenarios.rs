//! End-to-end scenarios from §8, driven through the compiled `tq` binary.

mod common;

use common::Workspace;
use predicates::prelude::*;

fn first_line(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout).lines().next().unwrap_or("").to_string()
}

#[test]
fn scenario_basic_claim() {
    let ws = Workspace::new();
    let created = ws.tq(["create", "T1", "--created-by", "human"]).assert().success();
    let id = first_line(&created.get_output().stdout);
    assert!(id.contains('1'));

    ws.tq(["claim-next", "--agent", "a1"]).assert().success().stdout(predicate::str::contains("claimed #1"));
    ws.tq(["claim-next", "--agent", "a2"]).assert().failure();
}

#[test]
fn scenario_blocked_claim() {
    let ws = Workspace::new();
    ws.tq(["create", "Pre"]).assert().success();
    ws.tq(["create", "Post", "--blocked-by", "1"]).assert().success();

    ws.tq(["claim-next", "--agent", "a"]).assert().success().stdout(predicate::str::contains("#1"));
    ws.tq(["claim-next", "--agent", "b"]).assert().failure();

    ws.tq(["mark-done", "1"]).assert().success();
    ws.tq(["claim-next", "--agent", "b"]).assert().success().stdout(predicate::str::contains("#2"));
}

#[test]
fn scenario_block_auto_unclaim() {
    let ws = Workspace::new();
    ws.tq(["create", "X"]).assert().success();
    ws.tq(["create", "Y"]).assert().success();

    ws.tq(["claim-next", "--agent", "a1"]).assert().success();
    ws.tq(["block", "1", "--by", "2"]).assert().success();

    ws.tq(["show", "1", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"open\"").and(predicate::str::contains("\"assigned_to\":null")));

    let log = ws.tq(["log", "--limit", "10"]).assert().success();
    let stdout = String::from_utf8_lossy(&log.get_output().stdout).to_string();
    let blocker_line = stdout.lines().position(|l| l.contains("blocker_added")).unwrap();
    let unclaimed_line = stdout.lines().position(|l| l.contains("unclaimed")).unwrap();
    assert!(blocker_line < unclaimed_line, "newest-first log must show blocker_added before unclaimed");
}

#[test]
fn scenario_dependents_copy() {
    let ws = Workspace::new();
    ws.tq(["create", "A"]).assert().success();
    ws.tq(["create", "B", "--blocked-by", "1"]).assert().success();
    ws.tq(["create", "C", "--block-dependents-of", "1"]).assert().success();

    ws.tq(["show", "2", "--format", "json"]).assert().success().stdout(
        predicate::str::contains("\"blocked_by\":[1,3]").or(predicate::str::contains("\"blocked_by\":[3,1]")),
    );
}

#[test]
fn scenario_orphan_recovery() {
    let ws = Workspace::new();
    ws.tq(["create", "A1"]).assert().success();
    ws.tq(["create", "A2", "--assign", "human"]).assert().success();
    ws.tq(["create", "A3"]).assert().success();

    ws.tq(["claim-next", "--agent", "a1"]).assert().success();
    ws.tq(["claim-next", "--agent", "a1"]).assert().success();
    ws.tq(["mark-done", "3"]).assert().success();

    ws.tq(["recover"]).assert().success().stdout(predicate::str::contains("1"));

    ws.tq(["show", "1", "--format", "json"]).assert().success().stdout(predicate::str::contains("\"status\":\"open\""));
    ws.tq(["show", "2", "--format", "json"]).assert().success().stdout(predicate::str::contains("\"assigned_to\":\"human\""));
    ws.tq(["show", "3", "--format", "json"]).assert().success().stdout(predicate::str::contains("\"status\":\"done\""));
}

#[test]
fn scenario_schema_gate() {
    let dir = tempfile::TempDir::new().unwrap();
    let db = dir.path().join("tickets.db");
    std::fs::write(&db, []).unwrap();

    let mut cmd = assert_cmd::Command::cargo_bin("tq").unwrap();
    cmd.arg("--db").arg(&db).arg("list");
    cmd.assert().failure().stderr(predicate::str::contains("schema"));

    let mut migrate = assert_cmd::Command::cargo_bin("tq").unwrap();
    migrate.arg("--db").arg(&db).arg("migrate");
    migrate.assert().success();
}
