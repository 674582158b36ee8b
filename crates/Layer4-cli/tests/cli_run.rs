//! harness 바이너리 통합 테스트
//!
//! `cargo test -p harness-cli --test cli_run`

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn harness(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_harness"))
        .current_dir(dir)
        .env_remove("HARNESS_PLUGINS_DIR")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run harness")
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("plugins")).unwrap();
    fs::write(dir.path().join("plugins/results_plugin.toml"), "").unwrap();
    fs::write(
        dir.path().join("plugins/timing_plugin.toml"),
        "module = \"durations\"\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("suite.toml"),
        r#"
name = "cli"

[[group]]
name = "g"

[[group.case]]
name = "ok"
command = "true"

[[group.case]]
name = "fails"
command = "sh -c 'exit 4'"
"#,
    )
    .unwrap();
    dir
}

#[test]
fn test_plugins_json() {
    let dir = workspace();
    let output = harness(dir.path(), &["plugins", "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = summary
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["results", "durations"]);

    // --durations가 없으므로 설정 후 비활성
    let durations = &summary[1];
    assert_eq!(durations["enabled"], false);
    assert_eq!(summary[0]["vital"], true);
}

#[test]
fn test_run_reports_failure_exit_code() {
    let dir = workspace();
    let output = harness(dir.path(), &["run", "suite.toml", "--workers", "2", "--json"]);

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["suite"], "cli");
    assert_eq!(report["results"].as_array().unwrap().len(), 2);
}

#[test]
fn test_fail_fast_aborts_run() {
    let dir = workspace();
    let output = harness(dir.path(), &["run", "suite.toml", "--fail-fast"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("results"), "{}", stderr);
    assert!(stderr.contains("post_test_case"), "{}", stderr);
}

#[test]
fn test_vital_configuration_error() {
    let dir = workspace();
    fs::write(dir.path().join("harness.toml"), "[results]\nmax_failures = -3\n").unwrap();

    let output = harness(dir.path(), &["plugins"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("vital component results"), "{}", stderr);
}

#[test]
fn test_unknown_plugin_module_aborts() {
    let dir = workspace();
    fs::write(
        dir.path().join("plugins/bogus_plugin.toml"),
        "module = \"nope\"\n",
    )
    .unwrap();

    let output = harness(dir.path(), &["plugins"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown plugin module 'nope'"), "{}", stderr);
}
