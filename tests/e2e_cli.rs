//! CLI end-to-end tests
//!
//! Tests for the newreleases command-line interface.

mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{album_json, days_ago, following_json, paging_json, saved_albums_json, saved_tracks_json};

/// Get a command for the newreleases binary, isolated from the caller's
/// config files and token.
#[allow(deprecated)]
fn newreleases_cmd(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("newreleases").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env_remove("NEWRELEASES_ACCESS_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    let dir = tempdir().unwrap();
    newreleases_cmd(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let dir = tempdir().unwrap();
    newreleases_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("newreleases"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let dir = tempdir().unwrap();
    newreleases_cmd(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_scan_help() {
    let dir = tempdir().unwrap();
    newreleases_cmd(dir.path())
        .args(["scan", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--days"))
        .stdout(predicate::str::contains("--optimized-search"));
}

#[test]
fn test_cli_validate_config_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[scan]\nwindow_days = 21\n\n[scheduler]\nbatch_size = 5\n",
    )
    .unwrap();

    newreleases_cmd(dir.path())
        .arg("validate")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Window: 21 days"))
        .stdout(predicate::str::contains("Access token: missing"));
}

#[test]
fn test_cli_validate_rejects_bad_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[scan]\npage_size = 500\n").unwrap();

    newreleases_cmd(dir.path())
        .arg("validate")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("page_size"));
}

#[test]
fn test_cli_scan_without_token_explains() {
    let dir = tempdir().unwrap();
    newreleases_cmd(dir.path())
        .arg("scan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NEWRELEASES_ACCESS_TOKEN"));
}

#[test]
fn test_cli_scan_rejects_zero_days() {
    let dir = tempdir().unwrap();
    newreleases_cmd(dir.path())
        .args(["scan", "--days", "0"])
        .env("NEWRELEASES_ACCESS_TOKEN", "token")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--days"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cli_scan_json_against_mock_catalog() {
    let server = MockServer::start().await;
    Mock::given(path("/me/following"))
        .respond_with(ResponseTemplate::new(200).set_body_json(following_json(&[("a", "Alpha")])))
        .mount(&server)
        .await;
    Mock::given(path("/me/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(saved_tracks_json(&[])))
        .mount(&server)
        .await;
    Mock::given(path("/me/albums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(saved_albums_json(&[])))
        .mount(&server)
        .await;
    Mock::given(path("/artists/a/albums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paging_json(
            vec![
                album_json("fresh", "a", "album", 10, &days_ago(1)),
                album_json("stale", "a", "album", 10, &days_ago(30)),
            ],
            0,
            20,
            2,
        )))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "[catalog]\nbase_url = \"{}\"\naccess_token = \"token\"\n\n[scheduler]\nartist_delay_ms = 0\nbatch_delay_ms = 0\n",
            server.uri()
        ),
    )
    .unwrap();

    let output = tokio::task::spawn_blocking(move || {
        newreleases_cmd(dir.path())
            .args(["-c"])
            .arg(&config_path)
            .args(["scan", "--json"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let releases = json["releases"].as_array().unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0]["id"], "fresh");
    assert_eq!(releases[0]["category"], "album");
    assert_eq!(json["summary"]["succeeded_artists"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cli_scan_with_maximum_days_keeps_everything() {
    let server = MockServer::start().await;
    Mock::given(path("/me/following"))
        .respond_with(ResponseTemplate::new(200).set_body_json(following_json(&[("a", "Alpha")])))
        .mount(&server)
        .await;
    Mock::given(path("/me/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(saved_tracks_json(&[])))
        .mount(&server)
        .await;
    Mock::given(path("/me/albums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(saved_albums_json(&[])))
        .mount(&server)
        .await;
    Mock::given(path("/artists/a/albums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paging_json(
            vec![
                album_json("fresh", "a", "album", 10, &days_ago(1)),
                album_json("vintage", "a", "album", 10, "1969"),
            ],
            0,
            20,
            2,
        )))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "[catalog]\nbase_url = \"{}\"\naccess_token = \"token\"\n\n[scheduler]\nartist_delay_ms = 0\nbatch_delay_ms = 0\n",
            server.uri()
        ),
    )
    .unwrap();

    let output = tokio::task::spawn_blocking(move || {
        newreleases_cmd(dir.path())
            .args(["-c"])
            .arg(&config_path)
            .args(["scan", "--json", "--days", &u32::MAX.to_string()])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = json["releases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["fresh", "vintage"]);
}
