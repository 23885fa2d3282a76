//! Integration tests for the `beam` CLI.
//!
//! Each test creates a temp project directory, runs `beam` as a
//! subprocess, and verifies stdout and/or file contents.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Get the path to the built `beam` binary.
fn beam_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("beam");
    path
}

/// Create a small test project in the given directory.
///
/// Layout: two L1 areas weighted 60/40. The first decomposes down to two
/// L4 work units, one of them half done. Rolled up, project progress is
/// 60% * 25% = 15%.
fn create_test_project(root: &Path) {
    fs::write(
        root.join("beam.toml"),
        r#"[project]
name = "test-project"

[schedule]
weight_mode = "normalize"
"#,
    )
    .unwrap();

    fs::write(
        root.join("beam.json"),
        r#"{
  "people": [
    { "id": "ana", "name": "Ana Torres", "email": "ana@example.com" },
    { "id": "ben", "name": "Ben Ito" }
  ],
  "items": [
    { "id": "w1", "level": "level1", "parent": null, "name": "Platform", "weight": 60, "status": "pending" },
    { "id": "w2", "level": "level1", "parent": null, "name": "Rollout", "weight": 40, "status": "pending" },
    { "id": "w3", "level": "level2", "parent": "w1", "name": "Storage", "status": "pending" },
    { "id": "w4", "level": "level3", "parent": "w3", "name": "Write path", "status": "pending" },
    { "id": "w5", "level": "level4", "parent": "w4", "name": "Batch writer",
      "planned_start": "2026-03-02", "planned_end": "2026-03-06",
      "progress": 50, "status": "in_progress" },
    { "id": "w6", "level": "level4", "parent": "w4", "name": "Compaction",
      "planned_start": "2026-03-09", "planned_end": "2026-03-13",
      "status": "pending" }
  ],
  "tasks": []
}
"#,
    )
    .unwrap();
}

/// Run `beam` with the given args in the given directory.
fn run_beam(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(beam_bin())
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run beam");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `beam` expecting success, return stdout.
fn run_beam_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_beam(dir, args);
    if !success {
        panic!(
            "beam {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

// ---------------------------------------------------------------------------
// Read command tests
// ---------------------------------------------------------------------------

#[test]
fn test_tree_default() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["tree"]);
    assert!(out.contains("Platform"));
    assert!(out.contains("Batch writer"));
    assert!(out.contains("Rollout"));
    assert!(out.contains("project progress: 15%"));
}

#[test]
fn test_tree_subtree_and_depth() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["tree", "w3"]);
    assert!(out.contains("Storage"));
    assert!(out.contains("Compaction"));
    assert!(!out.contains("Rollout"));

    let out = run_beam_ok(tmp.path(), &["tree", "--depth", "2"]);
    assert!(out.contains("Storage"));
    assert!(!out.contains("Batch writer"));
}

#[test]
fn test_tree_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["tree", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["project"], "test-project");
    assert_eq!(parsed["progress"], 15);
    let roots = parsed["items"].as_array().unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0]["id"], "w1");
    assert_eq!(roots[0]["code"], "1");
    // Rollup: mean of the two L4 children
    assert_eq!(roots[0]["progress"], 25);
    assert_eq!(roots[0]["planned_start"], "2026-03-02");
    assert_eq!(roots[0]["planned_end"], "2026-03-13");
}

#[test]
fn test_show() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["show", "w5"]);
    assert!(out.contains("Batch writer"));
    assert!(out.contains("2026-03-02"));
}

#[test]
fn test_show_json_delayed_status() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    // Open item whose planned end has passed
    let out = run_beam_ok(tmp.path(), &["show", "w5", "--json", "--today", "2026-03-20"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["id"], "w5");
    assert_eq!(parsed["status"], "delayed");
}

#[test]
fn test_show_not_found() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let (_stdout, stderr, success) = run_beam(tmp.path(), &["show", "w99"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_stats_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["stats", "--json", "--today", "2026-02-01"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["progress"], 15);
    assert_eq!(parsed["items"], 6);
    assert_eq!(parsed["leaves"], 3); // w2, w5, w6
    assert_eq!(parsed["delayed"], 0);
    let roots = parsed["roots"].as_array().unwrap();
    assert_eq!(roots[0]["weight"], 60);
}

#[test]
fn test_check_clean_project() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["check"]);
    assert!(out.contains("ok"));
}

#[test]
fn test_people() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["people"]);
    assert!(out.contains("Ana Torres"));
    assert!(out.contains("ana@example.com"));
    assert!(out.contains("Ben Ito"));
}

// ---------------------------------------------------------------------------
// Write command tests
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_project() {
    let tmp = tempfile::TempDir::new().unwrap();

    let out = run_beam_ok(tmp.path(), &["init", "--name", "Demo"]);
    assert!(out.contains("Initialized beam project: Demo"));
    assert!(tmp.path().join("beam.toml").exists());
    assert!(tmp.path().join("beam.json").exists());

    // Re-running must refuse to clobber
    let (_stdout, _stderr, success) = run_beam(tmp.path(), &["init"]);
    assert!(!success);
}

#[test]
fn test_add_root_and_child() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["add", "Migration"]);
    assert!(out.contains("Migration"));

    let out = run_beam_ok(tmp.path(), &["add", "Read path", "--parent", "w3"]);
    assert!(out.contains("Read path"));

    let out = run_beam_ok(tmp.path(), &["tree"]);
    assert!(out.contains("Migration"));
    assert!(out.contains("Read path"));
}

#[test]
fn test_add_under_l4_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let (_stdout, stderr, success) = run_beam(tmp.path(), &["add", "Too deep", "--parent", "w5"]);
    assert!(!success);
    assert!(stderr.contains("L4"));
}

#[test]
fn test_schedule_and_clear() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    run_beam_ok(
        tmp.path(),
        &["schedule", "w6", "--start", "2026-03-16", "--end", "2026-03-20"],
    );
    let out = run_beam_ok(tmp.path(), &["show", "w6", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["planned_start"], "2026-03-16");

    run_beam_ok(tmp.path(), &["schedule", "w6", "--clear"]);
    let out = run_beam_ok(tmp.path(), &["show", "w6", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(parsed.get("planned_start").is_none() || parsed["planned_start"].is_null());
}

#[test]
fn test_schedule_rejects_inverted_dates() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let (_stdout, _stderr, success) = run_beam(
        tmp.path(),
        &["schedule", "w6", "--start", "2026-03-20", "--end", "2026-03-16"],
    );
    assert!(!success);
}

#[test]
fn test_schedule_rejects_non_leaf() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let (_stdout, _stderr, success) = run_beam(
        tmp.path(),
        &["schedule", "w4", "--start", "2026-03-02", "--end", "2026-03-06"],
    );
    assert!(!success);
}

#[test]
fn test_progress_rolls_up() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    run_beam_ok(tmp.path(), &["progress", "w6", "100"]);
    // w4 mean(50, 100) = 75; project = 60% * 75% = 45
    let out = run_beam_ok(tmp.path(), &["tree", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["progress"], 45);
}

#[test]
fn test_progress_rejects_non_leaf() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let (_stdout, _stderr, success) = run_beam(tmp.path(), &["progress", "w4", "80"]);
    assert!(!success);
}

#[test]
fn test_weight_warns_on_bad_total() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let (stdout, stderr, success) = run_beam(tmp.path(), &["weight", "w1", "70"]);
    assert!(success);
    assert!(stdout.contains("w1 weighted 70"));
    assert!(stderr.contains("110"));
}

#[test]
fn test_promote() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["promote", "w4"]);
    assert!(out.contains("w4 is now L2 at 1.2"));

    // The subtree moved with it
    let out = run_beam_ok(tmp.path(), &["show", "w5", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["level"], 3);
}

#[test]
fn test_demote_requires_preceding_sibling() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    // w1 is the first root: nothing to demote under
    let (_stdout, stderr, success) = run_beam(tmp.path(), &["demote", "w1"]);
    assert!(!success);
    assert!(stderr.contains("sibling"));

    // w2 tucks under w1 as an L2
    let out = run_beam_ok(tmp.path(), &["demote", "w2"]);
    assert!(out.contains("w2 is now L2"));
}

#[test]
fn test_demote_l4_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let (_stdout, _stderr, success) = run_beam(tmp.path(), &["demote", "w6"]);
    assert!(!success);
}

#[test]
fn test_rm_cascades() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["rm", "w3", "--yes"]);
    assert!(out.contains("deleted 4 item(s)"));

    let out = run_beam_ok(tmp.path(), &["tree"]);
    assert!(!out.contains("Batch writer"));
}

#[test]
fn test_mv_reorders_roots() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    run_beam_ok(tmp.path(), &["mv", "w2", "0"]);
    let out = run_beam_ok(tmp.path(), &["tree", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let roots = parsed["items"].as_array().unwrap();
    assert_eq!(roots[0]["id"], "w2");
    assert_eq!(roots[0]["code"], "1");
    assert_eq!(roots[1]["code"], "2");
}

// ---------------------------------------------------------------------------
// Bulk command tests
// ---------------------------------------------------------------------------

#[test]
fn test_assign() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(
        tmp.path(),
        &["assign", "w5", "w6", "--person", "ana", "--person", "ben"],
    );
    assert!(out.contains("2 item(s)"));

    let out = run_beam_ok(tmp.path(), &["show", "w5", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let assignees = parsed["assignees"].as_array().unwrap();
    assert_eq!(assignees.len(), 2);

    // Second run is a no-op (set union)
    let out = run_beam_ok(tmp.path(), &["assign", "w5", "--person", "ana"]);
    assert!(out.contains("0 item(s)"));
}

#[test]
fn test_assign_unknown_person_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let (_stdout, stderr, success) = run_beam(tmp.path(), &["assign", "w5", "--person", "zoe"]);
    assert!(!success);
    assert!(stderr.contains("unknown person"));
}

#[test]
fn test_register_l4_only() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["register", "w5", "w3"]);
    assert!(out.contains("registered w5"));
    assert!(out.contains("skipped w3"));

    let data = fs::read_to_string(tmp.path().join("beam.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&data).unwrap();
    let tasks = parsed["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["item_id"], "w5");
}

// ---------------------------------------------------------------------------
// Delay display and project discovery
// ---------------------------------------------------------------------------

#[test]
fn test_tree_shows_delay() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());

    let out = run_beam_ok(tmp.path(), &["tree", "--today", "2026-03-20"]);
    assert!(out.contains("[!]"));
    assert!(out.contains("+14d")); // w5 ended 2026-03-06
}

#[test]
fn test_project_dir_flag() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let elsewhere = tempfile::TempDir::new().unwrap();

    let dir = tmp.path().to_str().unwrap();
    let out = run_beam_ok(elsewhere.path(), &["tree", "-C", dir]);
    assert!(out.contains("Platform"));
}

#[test]
fn test_discovery_walks_up() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_project(tmp.path());
    let nested = tmp.path().join("docs").join("notes");
    fs::create_dir_all(&nested).unwrap();

    let out = run_beam_ok(&nested, &["tree"]);
    assert!(out.contains("Platform"));
}

#[test]
fn test_no_project_found() {
    let tmp = tempfile::TempDir::new().unwrap();

    let (_stdout, stderr, success) = run_beam(tmp.path(), &["tree"]);
    assert!(!success);
    assert!(stderr.contains("beam init"));
}
