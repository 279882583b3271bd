//! Integration tests for the ldaviz binary
//!
//! These tests run the built binary against seeded workspace directories and
//! check that JSON output is valid and artifacts land on disk.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn ldaviz(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ldaviz"))
        .arg("--dir")
        .arg(dir)
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn parse_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

/// Three configurations, each with two topics over the same vocabulary
fn seeded_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("parameters.txt"),
        "1 2 0.1 0.01\n2 2 0.2 0.01\n3 2 0.3 0.01\n",
    )
    .unwrap();

    fs::create_dir(dir.path().join("raw")).unwrap();
    for (id, shift) in [(1, 0.0), (2, 0.1), (3, 0.25)] {
        let raw = format!(
            "0 river {}\n0 valley {}\n1 river {}\n1 valley {}\n",
            0.7 - shift,
            0.3 + shift,
            0.2 + shift,
            0.8 - shift
        );
        fs::write(dir.path().join("raw").join(format!("{}.txt", id)), raw).unwrap();
    }
    dir
}

#[test]
fn test_status_json_is_valid() {
    let dir = seeded_workspace();

    let output = ldaviz(dir.path(), &["status", "--json"]);
    assert!(output.status.success(), "Command should succeed");

    let parsed = parse_json(&output);
    assert_eq!(parsed.get("status").and_then(|v| v.as_str()), Some("success"));
    let data = parsed.get("data").expect("Should have data field");
    assert_eq!(data.get("configurations").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(data.get("integrity").and_then(|v| v.as_str()), Some("Incomplete"));
}

#[test]
fn test_pipeline_writes_artifacts() {
    let dir = seeded_workspace();

    let output = ldaviz(dir.path(), &["pipeline", "--json"]);
    assert!(output.status.success(), "Command should succeed");

    let parsed = parse_json(&output);
    let coordinates = parsed["data"]["coordinates"].as_array().expect("Should list coordinates");
    assert_eq!(coordinates.len(), 3);
    assert!(dir.path().join("distances.txt").exists(), "Should save distances.txt");
    assert!(dir.path().join("coordinates.txt").exists(), "Should save coordinates.txt");

    let status = parse_json(&ldaviz(dir.path(), &["status", "--json"]));
    assert_eq!(status["data"]["integrity"].as_str(), Some("Consistent"));
}

#[test]
fn test_pipeline_recalculates_stale_distances() {
    let dir = seeded_workspace();
    fs::write(dir.path().join("distances.txt"), "1:2,0.1,0.01 2:2,0.2,0.01\n0 0.5\n0.5 0\n").unwrap();

    let output = ldaviz(dir.path(), &["pipeline", "--json"]);
    assert!(output.status.success(), "Command should succeed");

    let parsed = parse_json(&output);
    assert_eq!(parsed["data"]["coordinates"].as_array().map(Vec::len), Some(3));

    let distances = fs::read_to_string(dir.path().join("distances.txt")).unwrap();
    assert_eq!(distances.lines().count(), 4, "Should rewrite a 3x3 matrix with its header");
    let coordinates = fs::read_to_string(dir.path().join("coordinates.txt")).unwrap();
    assert_eq!(coordinates.lines().next().map(|h| h.split(' ').count()), Some(3));
}

#[test]
fn test_compare_reports_topic_grid() {
    let dir = seeded_workspace();

    let output = ldaviz(dir.path(), &["compare", "1", "3", "--json", "--metric", "hellinger"]);
    assert!(output.status.success(), "Command should succeed");

    let parsed = parse_json(&output);
    let grid = parsed["data"]["topic_distances"].as_array().expect("Should have a grid");
    assert_eq!(grid.len(), 2);
    assert_eq!(parsed["data"]["metric"].as_str(), Some("hellinger"));
    assert!(parsed["data"]["distance"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_sweep_writes_parameter_list() {
    let dir = TempDir::new().unwrap();

    let output = ldaviz(
        dir.path(),
        &["sweep", "--kappa", "2:4:1", "--alpha", "0.1", "--eta", "0.01", "--json"],
    );
    assert!(output.status.success(), "Command should succeed");

    let parsed = parse_json(&output);
    assert_eq!(parsed["data"]["configurations"].as_array().map(Vec::len), Some(3));

    let parameters = fs::read_to_string(dir.path().join("parameters.txt")).unwrap();
    assert_eq!(parameters.lines().count(), 3);
}

#[test]
fn test_unknown_action_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = ldaviz(dir.path(), &["run", "train-everything"]);
    assert!(!output.status.success());
}

#[test]
fn test_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let output = ldaviz(&dir.path().join("missing"), &["status"]);
    assert!(!output.status.success());
}

#[test]
fn test_coordinates_need_saved_distances() {
    let dir = seeded_workspace();
    let output = ldaviz(dir.path(), &["run", "calculate-coordinates"]);
    assert!(!output.status.success());
}
