//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn testaudit(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("testaudit").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("TESTAUDIT_DATA_DIR")
        .env_remove("TESTAUDIT_PARALLELISM");
    cmd
}

/// Temp dir with `testaudit init` already run.
fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    testaudit(&dir).arg("init").assert().success();
    dir
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    testaudit(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Test-session validity analyzer"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    testaudit(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("testaudit"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    testaudit(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created testaudit.toml"))
        .stdout(predicate::str::contains("Created sample dataset"));

    assert!(dir.path().join("testaudit.toml").exists());
    assert!(dir.path().join("testaudit-data/sessions.json").exists());
    assert!(dir.path().join("testaudit-data/questions.json").exists());
}

#[test]
fn init_skips_existing() {
    let dir = initialized();

    testaudit(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"))
        .stdout(predicate::str::contains("already has a dataset"));
}

#[test]
fn validate_sample_dataset() {
    let dir = initialized();

    testaudit(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("5 sessions (4 completed, 1 in progress"))
        .stdout(predicate::str::contains("Dataset valid."));
}

#[test]
fn validate_reports_duplicate_sessions() {
    let dir = initialized();
    let path = dir.path().join("testaudit-data/sessions.json");
    let mut sessions: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let first = sessions[0].clone();
    sessions.as_array_mut().unwrap().push(first);
    std::fs::write(&path, serde_json::to_string(&sessions).unwrap()).unwrap();

    testaudit(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("session 1 appears more than once"))
        .stdout(predicate::str::contains("1 warning(s) found."));
}

#[test]
fn validate_missing_dataset() {
    let dir = TempDir::new().unwrap();
    testaudit(&dir)
        .args(["--data-dir", "nowhere", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn analyze_all_classifies_sample_sessions() {
    let dir = initialized();

    let rows = stdout_json(testaudit(&dir).args(["analyze", "--all", "--format", "json"]));
    let statuses: Vec<(i64, String)> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|a| {
            (
                a["session_id"].as_i64().unwrap(),
                a["overall_status"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            (1, "valid".to_string()),
            (2, "invalid".to_string()),
            (3, "suspect".to_string()),
            (4, "invalid".to_string()),
        ]
    );
    assert!(dir.path().join("testaudit-data/assessments.json").exists());
}

#[test]
fn analyze_is_idempotent_across_invocations() {
    let dir = initialized();

    let first = stdout_json(testaudit(&dir).args(["analyze", "--session", "1", "--format", "json"]));
    let second = stdout_json(testaudit(&dir).args(["analyze", "--session", "1", "--format", "json"]));
    assert_eq!(first[0]["computed_at"], second[0]["computed_at"]);
    assert_eq!(first[0]["version"], second[0]["version"]);

    let forced = stdout_json(testaudit(&dir).args([
        "analyze", "--session", "1", "--force", "--format", "json",
    ]));
    assert_eq!(forced[0]["version"], 2);
}

#[test]
fn analyze_unknown_session_fails() {
    let dir = initialized();
    testaudit(&dir)
        .args(["analyze", "--session", "999"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("session 999 not found"));
}

#[test]
fn show_requires_assessment() {
    let dir = initialized();
    testaudit(&dir)
        .args(["show", "--session", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no validity assessment for session 1"));
}

#[test]
fn show_lists_flags() {
    let dir = initialized();
    testaudit(&dir).args(["analyze", "--all"]).assert().success();

    testaudit(&dir)
        .args(["show", "--session", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session 2: invalid"))
        .stdout(predicate::str::contains("multiple_rapid_responses"))
        .stdout(predicate::str::contains("total_time_too_fast"));
}

#[test]
fn override_rejects_short_reason() {
    let dir = initialized();
    testaudit(&dir).args(["analyze", "--all"]).assert().success();

    testaudit(&dir)
        .args([
            "override", "--session", "4", "--status", "valid", "--reason", "too short", "--admin",
            "alice",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 10 characters"));
}

#[test]
fn override_is_persisted() {
    let dir = initialized();
    testaudit(&dir).args(["analyze", "--all"]).assert().success();

    testaudit(&dir)
        .args([
            "override",
            "--session",
            "4",
            "--status",
            "valid",
            "--reason",
            "appeal upheld by review committee",
            "--admin",
            "alice",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("invalid -> valid"));

    let shown = stdout_json(testaudit(&dir).args(["show", "--session", "4", "--format", "json"]));
    assert_eq!(shown["overall_status"], "valid");
    assert_eq!(shown["computed_status"], "invalid");
    assert_eq!(shown["previous_status"], "invalid");
    assert_eq!(shown["overridden_by"], "alice");
}

#[test]
fn report_json_summary() {
    let dir = initialized();
    testaudit(&dir).args(["analyze", "--all"]).assert().success();

    let report = stdout_json(testaudit(&dir).args(["report", "--days", "7", "--format", "json"]));
    assert_eq!(report["summary"]["total"], 4);
    assert_eq!(report["summary"]["invalid"], 2);
    assert_eq!(report["action_needed"].as_array().unwrap().len(), 3);
    assert_eq!(report["by_flag_type"]["multiple_rapid_responses"], 1);
}

#[test]
fn report_fail_on_pending() {
    let dir = initialized();
    testaudit(&dir).args(["analyze", "--all"]).assert().success();

    testaudit(&dir)
        .args(["report", "--fail-on-pending"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Needs review"));
}

#[test]
fn report_html_to_file() {
    let dir = initialized();
    testaudit(&dir).args(["analyze", "--all"]).assert().success();

    testaudit(&dir)
        .args(["report", "--format", "html", "--output", "out/report.html"])
        .assert()
        .success();

    let html = std::fs::read_to_string(dir.path().join("out/report.html")).unwrap();
    assert!(html.contains("<html"));
    assert!(html.contains("testaudit validity report"));
}

#[test]
fn report_json_to_file() {
    let dir = initialized();
    testaudit(&dir).args(["analyze", "--all"]).assert().success();

    testaudit(&dir)
        .args(["report", "--format", "json", "--output", "out/report.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Written to"));

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("out/report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["summary"]["total"], 4);
}

#[test]
fn show_html_to_file() {
    let dir = initialized();
    testaudit(&dir).args(["analyze", "--all"]).assert().success();

    testaudit(&dir)
        .args(["show", "--session", "2", "--format", "html", "--output", "s2.html"])
        .assert()
        .success();

    let html = std::fs::read_to_string(dir.path().join("s2.html")).unwrap();
    assert!(html.contains("<html"));
    assert!(html.contains("multiple_rapid_responses"));
}
