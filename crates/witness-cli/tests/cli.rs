//! End-to-end tests for the `wtn` binary against a temp-dir store.

use std::path::Path;
use std::sync::Arc;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use witness_core::{Engine, FsStorage, Session};

fn wtn(store: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wtn").expect("binary builds");
    cmd.arg("--store").arg(store);
    cmd
}

/// Write one closed session into the store and return its final hash.
fn seed_session(store: &Path) -> String {
    let engine = Engine::new(
        Arc::new(FsStorage::open(store).expect("open")),
        ["student", "tool"],
    );
    let session = Session::new().with("student", "Alice").with("tool", "editor");
    engine.start(&session, None, None).expect("start");
    engine
        .event_to_session(json!({"type": "keystroke", "key": "a"}), &session, vec![], None)
        .expect("append");
    engine.close_session(&session, false).expect("close")
}

#[test]
fn init_then_ls_empty() {
    let tmp = TempDir::new().expect("tmp");
    let store = tmp.path().join("store");

    wtn(&store)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized store"));

    wtn(&store)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("(empty store)"));
}

#[test]
fn init_twice_requires_force() {
    let tmp = TempDir::new().expect("tmp");
    let store = tmp.path().join("store");

    wtn(&store).arg("init").assert().success();
    wtn(&store)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    wtn(&store).args(["init", "--force"]).assert().success();
}

#[test]
fn verify_reports_chain_length() {
    let tmp = TempDir::new().expect("tmp");
    let store = tmp.path().join("store");
    wtn(&store).arg("init").assert().success();
    let final_hash = seed_session(&store);

    wtn(&store)
        .arg("verify")
        .arg(&final_hash)
        .assert()
        .success()
        .stdout(predicate::str::contains("chain of 3 items"));

    let output = wtn(&store)
        .arg("--json")
        .arg("verify")
        .arg(&final_hash)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value = serde_json::from_slice(&output).expect("json");
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["items"], 3);
}

#[test]
fn verify_unknown_key_fails() {
    let tmp = TempDir::new().expect("tmp");
    let store = tmp.path().join("store");
    wtn(&store).arg("init").assert().success();

    wtn(&store)
        .args(["verify", "no-such-key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn sessions_walks_the_parent_index() {
    let tmp = TempDir::new().expect("tmp");
    let store = tmp.path().join("store");
    wtn(&store).arg("init").assert().success();
    let final_hash = seed_session(&store);

    wtn(&store)
        .args(["sessions", "student", "Alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains(final_hash.as_str()));

    wtn(&store)
        .args(["sessions", "student", "Nobody"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no finished sessions"));
}

#[test]
fn show_lists_items() {
    let tmp = TempDir::new().expect("tmp");
    let store = tmp.path().join("store");
    wtn(&store).arg("init").assert().success();
    let final_hash = seed_session(&store);

    wtn(&store)
        .arg("show")
        .arg(&final_hash)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 items"))
        .stdout(predicate::str::contains("close"));

    let output = wtn(&store)
        .arg("--json")
        .arg("show")
        .arg(&final_hash)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let items: serde_json::Value = serde_json::from_slice(&output).expect("json");
    assert_eq!(items.as_array().map(Vec::len), Some(3));
}

#[test]
fn delete_then_verify_erased() {
    let tmp = TempDir::new().expect("tmp");
    let store = tmp.path().join("store");
    wtn(&store).arg("init").assert().success();
    let final_hash = seed_session(&store);

    wtn(&store)
        .arg("delete")
        .arg(&final_hash)
        .args(["--reason", "erasure request #42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted"));

    wtn(&store)
        .arg("verify")
        .arg(&final_hash)
        .assert()
        .success()
        .stdout(predicate::str::contains("erased"));

    wtn(&store)
        .arg("show")
        .arg(&final_hash)
        .assert()
        .success()
        .stdout(predicate::str::contains("erasure request #42"));

    // Tombstones are hidden from ls by default, visible with --all.
    wtn(&store)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("tombstone").not());
    wtn(&store)
        .args(["ls", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tombstone"));
}
