//! CLI integration tests for framefind-cli.
//!
//! These tests verify the CLI behavior by running the actual binary
//! and checking outputs, exit codes, and file artifacts.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the framefind binary.
fn framefind() -> Command {
    Command::cargo_bin("framefind").unwrap()
}

#[test]
fn test_help_displays_usage() {
    framefind()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Find the episode and timestamp behind a still frame",
        ))
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn test_version_displays_version() {
    framefind()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("framefind"));
}

#[test]
fn test_ingest_help_shows_options() {
    framefind()
        .args(["ingest", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--corpus"))
        .stdout(predicate::str::contains("--workers"))
        .stdout(predicate::str::contains("--family"));
}

#[test]
fn test_search_help_shows_options() {
    framefind()
        .args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--min-similarity"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_stats_on_empty_store() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    let checkpoints = temp.path().join("checkpoints");

    framefind()
        .args([
            "stats",
            "--data",
            data.to_str().unwrap(),
            "--checkpoints",
            checkpoints.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fingerprints:"))
        .stdout(predicate::str::contains("0"));
}

#[test]
fn test_search_missing_image_fails() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");

    framefind()
        .args([
            "search",
            temp.path().join("nope.png").to_str().unwrap(),
            "--data",
            data.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read image"));
}

#[test]
fn test_search_empty_store_returns_no_match() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    let image = temp.path().join("query.png");
    // A 1x1 PNG, smallest valid query image.
    let png = image::DynamicImage::new_rgb8(1, 1);
    png.save(&image).unwrap();

    framefind()
        .args([
            "search",
            image.to_str().unwrap(),
            "--data",
            data.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No match"));
}

#[test]
fn test_ingest_rejects_unknown_family() {
    let temp = TempDir::new().unwrap();

    framefind()
        .args([
            "ingest",
            "--corpus",
            temp.path().to_str().unwrap(),
            "--family",
            "sha256",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown hash family"));
}
