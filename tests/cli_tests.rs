#![cfg(feature = "cli")]

use std::io::Write;

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

const SNAPSHOT: &str = r#"{
  "meta": { "startDate": "2025-01-06", "qaStart": "afterFE" },
  "teams": [{ "id": "team-1", "name": "Core", "sizes": { "BE": 1, "iOS": 1, "QA": 1 } }],
  "phases": [{ "id": "p1", "name": "Discovery", "order": 1 }],
  "tasks": [{
    "id": "t1",
    "projectId": "proj-1",
    "phaseIds": ["p1"],
    "efforts": [
      { "platform": "BE", "manDays": 10 },
      { "platform": "iOS", "manDays": 4 },
      { "platform": "QA", "manDays": 2 }
    ]
  }],
  "plans": [{ "id": "plan-1", "name": "Plan A", "projectId": "proj-1", "teamId": "team-1", "phaseIds": ["p1"], "bufferPct": 10 }]
}"#;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.write_stdin(script.to_string()).assert()
}

fn snapshot_file() -> NamedTempFile {
    snapshot_file_with(SNAPSHOT)
}

fn snapshot_file_with(json: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("create temp file");
    tmp.write_all(json.as_bytes()).expect("write snapshot");
    tmp
}

fn escaped(tmp: &NamedTempFile) -> String {
    tmp.path().to_string_lossy().replace('\\', "\\\\")
}

#[test]
fn cli_lists_plans_after_load() {
    let tmp = snapshot_file();
    run_cli(&format!("load {}\nplans\nquit\n", escaped(&tmp)))
        .success()
        .stdout(str_contains("Snapshot loaded from"))
        .stdout(str_contains("Plan A"));
}

#[test]
fn cli_table_aligns_non_ascii_names() {
    let tmp = snapshot_file_with(&SNAPSHOT.replace("Plan A", "Plän Ünïcödé"));
    let assert = run_cli(&format!("load {}\nplans\nquit\n", escaped(&tmp))).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let widths: Vec<usize> = output
        .lines()
        .map(|line| line.trim_start_matches("> "))
        .filter(|line| line.starts_with('+') || line.starts_with('|'))
        .map(|line| line.chars().count())
        .collect();
    assert_eq!(widths.len(), 5, "unexpected output:\n{}", output);
    assert!(widths.iter().all(|w| *w == widths[0]), "ragged table:\n{}", output);
    assert!(output.contains("Plän Ünïcödé"));
}

#[test]
fn cli_totals_apply_buffer() {
    let tmp = snapshot_file();
    run_cli(&format!("load {}\ntotals plan-1\nquit\n", escaped(&tmp)))
        .success()
        .stdout(str_contains("11.0"))
        .stdout(str_contains("4.4"));
}

#[test]
fn cli_show_prints_lane_windows() {
    let tmp = snapshot_file();
    let assert = run_cli(&format!("load {}\nbuffer\nshow plan-1\nquit\n", escaped(&tmp))).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Chart 2025-01-06"), "unexpected output:\n{}", output);
    assert!(output.contains("Discovery"));
    assert!(output.contains("Unknown command"));
}

#[test]
fn cli_override_and_clear() {
    let tmp = snapshot_file();
    let script = format!(
        "load {}\noverride plan-1 p1 QA 2025-03-03\nclear plan-1 p1 QA\nclear plan-1 p1 QA\nquit\n",
        escaped(&tmp)
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Override set."))
        .stdout(str_contains("2025-03-03"))
        .stdout(str_contains("Override cleared."))
        .stdout(str_contains("No override for p1 QA."));
}

#[test]
fn cli_rejects_bad_arguments() {
    run_cli("override plan-1 p1 QA someday\nqa sometimes\nstart 2025-13-01\nshow missing\nquit\n")
        .success()
        .stdout(str_contains("Invalid date (YYYY-MM-DD)"))
        .stdout(str_contains("unknown QA start rule 'sometimes'"))
        .stdout(str_contains("Usage: start <YYYY-MM-DD>"))
        .stdout(str_contains("plan 'missing' not found"));
}

#[test]
fn cli_settings_are_shown() {
    run_cli("stagger 3\nqa afterFE\nefficiency 0.8\nstart 2025-02-03\nmeta show\nquit\n")
        .success()
        .stdout(str_contains("stagger_days: 3"))
        .stdout(str_contains("qa_start: afterFE"))
        .stdout(str_contains("efficiency: 0.8"))
        .stdout(str_contains("start_date: 2025-02-03"));
}

#[test]
fn cli_rejects_efficiency_below_floor() {
    run_cli("efficiency 1e-8\nefficiency 0\nmeta show\nquit\n")
        .success()
        .stdout(str_contains("Efficiency must be a number of at least 0.01"))
        .stdout(str_contains("efficiency: 1\n"));
}

#[test]
fn cli_chart_renders_text_gantt() {
    let tmp = snapshot_file();
    run_cli(&format!("load {}\nchart plan-1\nquit\n", escaped(&tmp)))
        .success()
        .stdout(str_contains("business days"))
        .stdout(str_contains("#"));
}

#[test]
fn cli_save_writes_snapshot() {
    let tmp = snapshot_file();
    let out = NamedTempFile::new().expect("create temp file");
    let script = format!(
        "load {}\noverride plan-1 p1 BE 2025-01-08\nsave {}\nquit\n",
        escaped(&tmp),
        escaped(&out)
    );
    run_cli(&script).success().stdout(str_contains("Snapshot saved to"));
    let saved = std::fs::read_to_string(out.path()).expect("read saved snapshot");
    assert!(saved.contains("2025-01-08"));
}
