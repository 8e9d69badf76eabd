//! CLI integration tests for rwdemo
//!
//! Runs the binary end-to-end in script mode with logs and config isolated
//! under a temp dir.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command with data/config dirs and cwd pointed into `temp_dir`
#[allow(deprecated)]
fn rwdemo_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rwdemo").unwrap();
    cmd.current_dir(temp_dir)
        .env("XDG_DATA_HOME", temp_dir.path().join("data"))
        .env("XDG_CONFIG_HOME", temp_dir.path().join("config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("stdout is not utf-8")
}

fn index_of(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} missing from output:\n{haystack}"))
}

#[test]
fn test_banner_lists_keys_and_assertions() {
    let temp_dir = TempDir::new().unwrap();
    rwdemo_cmd(&temp_dir)
        .arg("banner")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome to reader-writer concurrency demo."))
        .stdout(predicate::str::contains("x will exit a reader"))
        .stdout(predicate::str::contains("Assertion 4"));
}

#[test]
fn test_script_writer_waits_for_reader() {
    let temp_dir = TempDir::new().unwrap();
    let out = stdout_of(rwdemo_cmd(&temp_dir).args(["script", "rw", "--settle-ms", "50"]));

    let reading = index_of(&out, "Reader 0 is reading...");
    let writer_waiting = index_of(&out, "Writer 0 is waiting for lock...");
    let reader_exiting = index_of(&out, "Reader 0 is exiting...");
    let writing = index_of(&out, "Writer 0 is writing...");

    assert!(reading < reader_exiting);
    assert!(writer_waiting < reader_exiting);
    assert!(reader_exiting < writing, "writer wrote while the reader held the lock:\n{out}");
    assert!(out.contains("done: 2 released on exit, 2 finished, 0 aborted"));
}

#[test]
fn test_script_release_keys() {
    let temp_dir = TempDir::new().unwrap();
    let out = stdout_of(rwdemo_cmd(&temp_dir).args(["script", "x r r x", "-s", "20"]));

    assert!(out.contains("no live reader to release"));
    assert!(out.contains("Reader 0 is reading..."));
    assert!(out.contains("Reader 1 is reading..."));
    assert!(out.contains("done: 1 released on exit, 2 finished, 0 aborted"));
}

#[test]
fn test_script_unmapped_key_exits() {
    let temp_dir = TempDir::new().unwrap();
    rwdemo_cmd(&temp_dir)
        .args(["script", "rzw", "-s", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("key 'z' exits"))
        .stdout(predicate::str::contains("Writer 0").not());
}

#[test]
fn test_script_ignore_invalid_keeps_going() {
    let temp_dir = TempDir::new().unwrap();
    rwdemo_cmd(&temp_dir)
        .args(["script", "rzw", "-s", "10", "--ignore-invalid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("invalid key pressed: 'z'"))
        .stdout(predicate::str::contains("Writer 0 is writing..."));
}

#[test]
fn test_config_file_sets_policy_and_event_log() {
    let temp_dir = TempDir::new().unwrap();
    let events = temp_dir.path().join("events.jsonl");
    let config = temp_dir.path().join("demo.yml");
    std::fs::write(
        &config,
        format!("invalid-key: ignore\nsettle-ms: 10\nevent-log: {}\n", events.display()),
    )
    .unwrap();

    rwdemo_cmd(&temp_dir)
        .args(["--config", config.to_str().unwrap(), "script", "wzq"])
        .assert()
        .success()
        .stdout(predicate::str::contains("invalid key pressed: 'z'"));

    let log = std::fs::read_to_string(&events).unwrap();
    assert_eq!(log.lines().count(), 3);
    assert!(log.contains("\"type\":\"Holding\""));
}

#[test]
fn test_missing_config_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    rwdemo_cmd(&temp_dir)
        .args(["--config", "nope.yml", "banner"])
        .assert()
        .failure();
}

#[test]
fn test_log_file_is_written() {
    let temp_dir = TempDir::new().unwrap();
    rwdemo_cmd(&temp_dir).args(["-l", "debug", "banner"]).assert().success();

    let log = temp_dir.path().join("data").join("rwdemo").join("logs").join("rwdemo.log");
    let content = std::fs::read_to_string(log).unwrap();
    assert!(content.contains("Logging initialized"));
}
