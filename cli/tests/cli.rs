//! Smoke tests for the cinder binary.

#![cfg(target_os = "linux")]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn heap_summary_save_to_file_writes_an_artifact() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("cinder")
        .unwrap()
        .args(["--dir", dir.path().to_str().unwrap()])
        .args(["heap-summary", "--save-to-file"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Heap dump summary written to:"));

    let saved: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("heapsummary-") && name.ends_with(".cinderheap"))
        .collect();
    assert_eq!(saved.len(), 1);
}

#[test]
fn heap_dump_with_unknown_compress_flag_still_succeeds() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("cinder")
        .unwrap()
        .args(["--dir", dir.path().to_str().unwrap()])
        .args(["heap-dump", "--compress", "sevenzip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Heap dump written to:"))
        .stdout(predicate::str::contains("Compressing").not());

    let dumps: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".memsnap"))
        .collect();
    assert_eq!(dumps.len(), 1);
}
