//! CLI end-to-end tests for the vidlink binary.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

#[allow(deprecated)]
fn vidlink_cmd() -> Command {
    let mut cmd = Command::cargo_bin("vidlink").unwrap();
    cmd.env_remove("VIDLINK_CONFIG");
    cmd
}

/// Write a config whose database and storage live under `dir`.
fn write_config(dir: &Path) -> PathBuf {
    let config = serde_json::json!({
        "server": { "db_path": dir.join("vidlink.db") },
        "storage": { "root_dir": dir.join("store") },
    });
    let path = dir.join("config.json");
    fs::write(&path, config.to_string()).unwrap();
    path
}

#[test]
fn no_args_shows_help() {
    vidlink_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_commands() {
    vidlink_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("prune-links"))
        .stdout(predicate::str::contains("reconcile"));
}

#[test]
fn version_command() {
    vidlink_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("vidlink "));
}

#[test]
fn validate_defaults() {
    vidlink_cmd()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("Duration limits: 5-25s"));
}

#[test]
fn validate_reports_warnings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"limits": {"min_duration_secs": 30, "max_duration_secs": 10}}"#,
    )
    .unwrap();

    vidlink_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("min_duration_secs (30)"));
}

#[test]
fn validate_rejects_malformed_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    vidlink_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config parse error"));
}

#[test]
fn reconcile_sweeps_staging() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let staging = dir.path().join("store").join("staging");
    fs::create_dir_all(&staging).unwrap();
    fs::write(staging.join("upload-leftover"), b"partial").unwrap();

    vidlink_cmd()
        .arg("--config")
        .arg(&config)
        .arg("reconcile")
        .assert()
        .success()
        .stdout(predicate::str::contains("Staging files removed: 1"));

    assert!(!staging.join("upload-leftover").exists());
}

#[test]
fn reconcile_refuses_while_writes_are_recent() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    {
        let db_path = dir.path().join("vidlink.db");
        let pool = vl_db::pool::init_pool(db_path.to_str().unwrap()).unwrap();
        let conn = vl_db::pool::get_conn(&pool).unwrap();
        vl_db::queries::pending_outputs::mark_pending(&conn, "videos/in-flight.mp4").unwrap();
    }

    vidlink_cmd()
        .arg("--config")
        .arg(&config)
        .arg("reconcile")
        .assert()
        .failure()
        .stderr(predicate::str::contains("a server may be running"));

    vidlink_cmd()
        .arg("--config")
        .arg(&config)
        .arg("reconcile")
        .arg("--force")
        .assert()
        .success()
        .stdout(predicate::str::contains("Orphaned outputs removed: 1"));
}

#[test]
fn prune_links_on_fresh_database() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    vidlink_cmd()
        .arg("--config")
        .arg(&config)
        .arg("prune-links")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 expired link(s)"));
}

#[test]
fn probe_missing_file_fails() {
    vidlink_cmd()
        .arg("probe")
        .arg("/nonexistent/clip.mp4")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
