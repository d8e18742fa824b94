use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn write_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn runs_program_and_prints_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "prog.wnd", "main { int x; x = 3 + 4; cout << x; }");

    Command::cargo_bin("wendc")
        .unwrap()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::eq("7\n"));
}

#[test]
fn tac_stage_prints_listing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "prog.wnd", "main { int x; x = 1; }");

    Command::cargo_bin("wendc")
        .unwrap()
        .arg(&path)
        .arg("--stage")
        .arg("tac")
        .assert()
        .success()
        .stdout(predicate::str::contains("declare int x"));
}

#[test]
fn unknown_stage_fails_with_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "prog.wnd", "main { int x; }");

    Command::cargo_bin("wendc")
        .unwrap()
        .arg(&path)
        .arg("--stage")
        .arg("bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown --stage"));
}

#[test]
fn missing_file_reports_read_error() {
    Command::cargo_bin("wendc")
        .unwrap()
        .arg("/no/such/file.wnd")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn semantic_errors_are_reported_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "prog.wnd", "main { int x; int x; }");

    Command::cargo_bin("wendc")
        .unwrap()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("semantic:"));
}

#[test]
fn stdin_feeds_cin_when_no_input_file_given() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "prog.wnd", "main { int a; cin >> a; cout << a; }");

    Command::cargo_bin("wendc")
        .unwrap()
        .arg(&path)
        .write_stdin("17\n")
        .assert()
        .success()
        .stdout(predicate::eq("17\n"));
}

#[test]
fn input_file_feeds_cin() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "prog.wnd", "main { int a; cin >> a; cout << a; }");
    let input_path = write_source(&dir, "input.txt", "42\n");

    Command::cargo_bin("wendc")
        .unwrap()
        .arg(&path)
        .arg("--input")
        .arg(&input_path)
        .assert()
        .success()
        .stdout(predicate::eq("42\n"));
}
