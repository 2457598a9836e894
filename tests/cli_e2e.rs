//! End-to-end CLI tests for the citefetch binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn citefetch() -> Command {
    let mut cmd = Command::cargo_bin("citefetch").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    citefetch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("arXiv"))
        .stdout(predicate::str::contains("--failed-file"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    citefetch()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("citefetch"));
}

#[test]
fn test_binary_without_dataset_fails() {
    citefetch()
        .assert()
        .failure()
        .stderr(predicate::str::contains("<DATASET>"));
}

#[test]
fn test_binary_missing_dataset_file_exits_one() {
    let temp = TempDir::new().unwrap();
    citefetch()
        .arg(temp.path().join("nope.csv"))
        .arg("-o")
        .arg(temp.path().join("downloads"))
        .arg("-f")
        .arg(temp.path().join("failed.log"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope.csv"));
}

#[test]
fn test_binary_missing_column_exits_one() {
    let temp = TempDir::new().unwrap();
    let dataset = temp.path().join("batch.csv");
    std::fs::write(&dataset, "Title,Abstract\nA,B\n").unwrap();

    citefetch()
        .arg(&dataset)
        .arg("-f")
        .arg(temp.path().join("failed.log"))
        .arg("-o")
        .arg(temp.path().join("downloads"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("IntroRefer"));
}

#[test]
fn test_binary_inverted_pause_exits_one() {
    let temp = TempDir::new().unwrap();
    let dataset = temp.path().join("batch.csv");
    std::fs::write(&dataset, "IntroRefer\nx\n").unwrap();

    citefetch()
        .arg(&dataset)
        .args(["--pause-min-ms", "10", "--pause-max-ms", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("courtesy pause"));
}

#[test]
fn test_binary_dataset_without_citations_succeeds() {
    let temp = TempDir::new().unwrap();
    let dataset = temp.path().join("batch.csv");
    std::fs::write(&dataset, "IntroRefer\nplain text without markers\n\n").unwrap();
    let downloads = temp.path().join("out/pdfs");
    let failed = temp.path().join("logs/failed.log");

    citefetch()
        .arg(&dataset)
        .arg("-o")
        .arg(&downloads)
        .arg("-f")
        .arg(&failed)
        .args(["--pause-min-ms", "0", "--pause-max-ms", "0", "--json", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 0"));

    assert!(downloads.is_dir());
    assert!(failed.exists());
}
