use assert_cmd::Command;
use chrono::Utc;
use tempfile::TempDir;

use typeamp::config::{Difficulty, TestMode};
use typeamp::history::{HistorySink, SqliteHistory, TestResult, DEFAULT_HISTORY_CAPACITY};

fn seeded_home(results: usize) -> TempDir {
    let home = tempfile::tempdir().unwrap();
    let db = home.path().join(".local/state/typeamp/history.db");
    let mut history = SqliteHistory::open(&db, DEFAULT_HISTORY_CAPACITY).unwrap();
    for i in 0..results {
        history
            .persist(&TestResult {
                id: uuid::Uuid::new_v4(),
                timestamp: Utc::now(),
                mode: TestMode::Words,
                duration: None,
                word_count: Some(10),
                text_source: "english".into(),
                difficulty: Difficulty::Normal,
                punctuation: false,
                wpm: 40 + i as u32,
                accuracy: 95,
                total_chars: 60,
                correct_chars: 57,
                incorrect_chars: 3,
                elapsed_ms: 15_000,
            })
            .unwrap();
    }
    home
}

fn typeamp(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("typeamp").unwrap();
    cmd.env("HOME", home.path()).env_remove("TYPEAMP_LOG");
    cmd
}

#[test]
fn history_prints_most_recent_first() {
    let home = seeded_home(3);
    let out = typeamp(&home)
        .args(["--history", "2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("42 wpm"));
    assert!(lines[1].contains("41 wpm"));
    assert!(lines[0].contains("10 words"));
}

#[test]
fn history_on_an_empty_database() {
    let home = tempfile::tempdir().unwrap();
    let out = typeamp(&home)
        .arg("--history")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(String::from_utf8(out).unwrap().contains("no results yet"));
}

#[test]
fn export_csv_writes_every_result() {
    let home = seeded_home(2);
    let target = home.path().join("results.csv");
    typeamp(&home)
        .arg("--export-csv")
        .arg(&target)
        .assert()
        .success();

    let mut reader = csv::Reader::from_path(&target).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert!(headers.iter().any(|h| h == "wpm"));
    assert_eq!(reader.records().count(), 2);
}

#[test]
fn interactive_mode_needs_a_tty() {
    let home = tempfile::tempdir().unwrap();
    typeamp(&home).write_stdin("").assert().failure();
}
