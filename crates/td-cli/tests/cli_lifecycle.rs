//! End-to-end coverage of the `td` binary: each test runs in its own
//! tempdir with `TD_HOME` and the cwd redirected so the store root and
//! session files never touch a developer's real home directory.

use assert_cmd::Command;
use tempfile::TempDir;

fn cmd(store_root: &std::path::Path, home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("td").unwrap();
    cmd.current_dir(store_root);
    cmd.env("TD_HOME", home);
    cmd.env("CLAUDE_SESSION_ID", "test-session");
    cmd
}

#[test]
#[serial]
fn create_then_list_round_trips_through_the_binary() {
    let store_root = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    cmd(store_root.path(), home.path())
    .args(["create", "fix the thing", "--type", "bug", "--priority", "high"])
    .assert()
    .success()
    .stdout(predicates::str::contains("CREATED td-"));

    cmd(store_root.path(), home.path())
    .args(["list", "type = bug"])
    .assert()
    .success()
    .stdout(predicates::str::contains("fix the thing"));
}

#[test]
#[serial]
fn self_approval_is_rejected_end_to_end() {
    let store_root = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    let output = cmd(store_root.path(), home.path())
    .args(["create", "needs review", "--json"])
    .output()
    .unwrap();
    let created: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    cmd(store_root.path(), home.path()).args(["start", &id]).assert().success();
    cmd(store_root.path(), home.path()).args(["review", &id]).assert().success();

    cmd(store_root.path(), home.path())
    .args(["approve", &id])
    .assert()
    .failure()
    .code(1)
    .stderr(predicates::str::contains("cannot approve your own implementation"));
}

#[test]
#[serial]
fn invalid_tdq_filter_exits_with_usage_code() {
    let store_root = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    cmd(store_root.path(), home.path())
    .args(["list", "status = nonsense_status"])
    .assert()
    .failure()
    .code(2);
}

#[test]
#[serial]
fn session_rotate_mints_a_new_chained_identity() {
    let store_root = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    let first = cmd(store_root.path(), home.path())
    .args(["session", "show", "--json"])
    .output()
    .unwrap();
    let first_session: serde_json::Value = serde_json::from_slice(&first.stdout).unwrap();

    let rotated = cmd(store_root.path(), home.path())
    .args(["session", "rotate", "--json"])
    .output()
    .unwrap();
    let rotated_session: serde_json::Value = serde_json::from_slice(&rotated.stdout).unwrap();

    assert_ne!(first_session["id"], rotated_session["id"]);
    assert_eq!(rotated_session["previous_session_id"], first_session["id"]);
}

#[test]
#[serial]
fn dependency_blocks_readiness_until_closed() {
    let store_root = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    let blocker_out = cmd(store_root.path(), home.path())
    .args(["create", "blocker", "--json"])
    .output()
    .unwrap();
    let blocker: serde_json::Value = serde_json::from_slice(&blocker_out.stdout).unwrap();
    let blocker_id = blocker["id"].as_str().unwrap().to_string();

    let target_out = cmd(store_root.path(), home.path())
    .args(["create", "target", "--json"])
    .output()
    .unwrap();
    let target: serde_json::Value = serde_json::from_slice(&target_out.stdout).unwrap();
    let target_id = target["id"].as_str().unwrap().to_string();

    cmd(store_root.path(), home.path())
    .args(["dep", "add", &target_id, &blocker_id])
    .assert()
    .success();

    cmd(store_root.path(), home.path())
    .args(["dep", "show", &target_id])
    .assert()
    .success()
    .stdout(predicates::str::contains("ready: false"));
}
