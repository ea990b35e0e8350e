//! CLI integration tests for the sqlstyle binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sqlstyle() -> Command {
    Command::cargo_bin("sqlstyle").expect("binary should exist")
}

/// Create a temp directory holding the given files.
fn setup_temp_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }
    dir
}

// ─── Already formatted ───

#[test]
fn test_formatted_file_unchanged() {
    let dir = setup_temp_dir(&[("query.sql", "SELECT 1\n")]);
    sqlstyle()
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("1 file(s) processed, 1 unchanged"));
}

#[test]
fn test_formatted_check_mode_passes() {
    let dir = setup_temp_dir(&[("query.sql", "SELECT 1\n")]);
    sqlstyle().arg("--check").arg(dir.path()).assert().success();
}

// ─── Reformatting ───

#[test]
fn test_file_reformatted_in_place() {
    let dir = setup_temp_dir(&[("query.sql", "select 1\n")]);
    sqlstyle()
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("1 reformatted"));

    let content = fs::read_to_string(dir.path().join("query.sql")).unwrap();
    assert_eq!(content, "SELECT 1\n");
}

#[test]
fn test_multi_statement_file() {
    let dir = setup_temp_dir(&[("q.sql", "insert t(a) values(1); delete t where a = 1;")]);
    sqlstyle().arg(dir.path().join("q.sql")).assert().success();

    let content = fs::read_to_string(dir.path().join("q.sql")).unwrap();
    assert_eq!(
        content,
        "INSERT INTO t (a)\nVALUES (1);\n\nDELETE FROM t\nWHERE a = 1;\n"
    );
}

#[test]
fn test_check_mode_fails_and_leaves_file() {
    let dir = setup_temp_dir(&[("query.sql", "select 1\n")]);
    sqlstyle()
        .arg("--check")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1 would be reformatted"));

    let content = fs::read_to_string(dir.path().join("query.sql")).unwrap();
    assert_eq!(content, "select 1\n");
}

#[test]
fn test_diff_mode_prints_unified_diff() {
    let dir = setup_temp_dir(&[("query.sql", "select 1\n")]);
    sqlstyle()
        .arg("--diff")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("-select 1"))
        .stderr(predicate::str::contains("+SELECT 1"));

    let content = fs::read_to_string(dir.path().join("query.sql")).unwrap();
    assert_eq!(content, "select 1\n");
}

#[test]
fn test_verbose_lists_changed_files() {
    let dir = setup_temp_dir(&[("a.sql", "select 1\n"), ("b.sql", "SELECT 2\n")]);
    sqlstyle()
        .arg("--check")
        .arg("--verbose")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("would reformat"))
        .stderr(predicate::str::contains("a.sql"))
        .stderr(predicate::str::contains("b.sql").not());
}

#[test]
fn test_quiet_mode_suppresses_summary() {
    let dir = setup_temp_dir(&[("query.sql", "select 1\n")]);
    sqlstyle()
        .arg("--quiet")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("file(s) processed").not());
}

// ─── File discovery ───

#[test]
fn test_non_sql_files_ignored() {
    let dir = setup_temp_dir(&[("notes.txt", "select 1\n"), ("nested/q.ddl", "select 1\n")]);
    sqlstyle()
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("1 file(s) processed"));

    assert_eq!(fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "select 1\n");
    assert_eq!(fs::read_to_string(dir.path().join("nested/q.ddl")).unwrap(), "SELECT 1\n");
}

#[test]
fn test_exclude_flag() {
    let dir = setup_temp_dir(&[("keep.sql", "select 1\n"), ("skip/q.sql", "select 1\n")]);
    sqlstyle()
        .arg("--exclude")
        .arg("skip")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("1 file(s) processed"));

    assert_eq!(fs::read_to_string(dir.path().join("skip/q.sql")).unwrap(), "select 1\n");
}

// ─── Stdin ───

#[test]
fn test_stdin_mode() {
    sqlstyle()
        .arg("-")
        .write_stdin("select a, b from t")
        .assert()
        .success()
        .stdout("SELECT a,\n    b\nFROM t\n");
}

#[test]
fn test_stdin_keyword_case_flag() {
    sqlstyle()
        .arg("--keyword-case")
        .arg("lower")
        .arg("-")
        .write_stdin("SELECT a FROM t")
        .assert()
        .success()
        .stdout("select a\nfrom t\n");
}

#[test]
fn test_stdin_indent_width_flag() {
    sqlstyle()
        .args(["--indent-width", "2", "-"])
        .write_stdin("select a, b from t")
        .assert()
        .success()
        .stdout("SELECT a,\n  b\nFROM t\n");
}

#[test]
fn test_stdin_align_aliases_flag() {
    sqlstyle()
        .args(["--align-aliases", "-"])
        .write_stdin("select a as x, long_name as y from t")
        .assert()
        .success()
        .stdout("SELECT a      AS x,\n    long_name AS y\nFROM t\n");
}

// ─── Configuration ───

#[test]
fn test_config_file_discovered() {
    let dir = setup_temp_dir(&[
        ("sqlstyle.toml", "[format]\nkeyword_case = \"lower\"\ninsert_into_keyword = false\n"),
        ("q.sql", "INSERT t (a) VALUES (1)\n"),
    ]);
    sqlstyle().arg(dir.path()).assert().success();

    let content = fs::read_to_string(dir.path().join("q.sql")).unwrap();
    assert_eq!(content, "insert t (a)\nvalues (1)\n");
}

#[test]
fn test_pyproject_tool_section() {
    let dir = setup_temp_dir(&[
        ("pyproject.toml", "[tool.sqlstyle.format]\nand_or_position = \"trailing\"\n"),
        ("q.sql", "select * from t where a = 1 and b = 2\n"),
    ]);
    sqlstyle().arg(dir.path()).assert().success();

    let content = fs::read_to_string(dir.path().join("q.sql")).unwrap();
    assert_eq!(content, "SELECT *\nFROM t\nWHERE a = 1 AND\n    b = 2\n");
}

#[test]
fn test_explicit_config_flag() {
    let dir = setup_temp_dir(&[
        ("custom.toml", "[format]\nindent_width = 2\n"),
        ("q.sql", "select a, b from t\n"),
    ]);
    sqlstyle()
        .arg("--config")
        .arg(dir.path().join("custom.toml"))
        .arg(dir.path().join("q.sql"))
        .assert()
        .success();

    let content = fs::read_to_string(dir.path().join("q.sql")).unwrap();
    assert_eq!(content, "SELECT a,\n  b\nFROM t\n");
}

#[test]
fn test_unknown_config_key_is_error() {
    let dir = setup_temp_dir(&[("sqlstyle.toml", "line_length = 80\n"), ("q.sql", "select 1\n")]);
    sqlstyle()
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_missing_config_file_is_error() {
    sqlstyle()
        .arg("--config")
        .arg("/nonexistent/sqlstyle.toml")
        .arg("-")
        .write_stdin("select 1")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Config file not found"));
}
