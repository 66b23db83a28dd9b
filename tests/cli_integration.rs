//! Runs the `lf-rate` binary end to end.

use std::path::PathBuf;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lf-rate"))
        .args(args)
        .env_remove("LF_RATE_SCENARIO")
        .env_remove("LF_RATE_REFERENCE_YEAR")
        .output()
        .expect("lf-rate process should run")
}

fn stdout_of(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}

fn parse_count(stdout: &str, label: &str) -> usize {
    let line = stdout
        .lines()
        .find(|line| line.starts_with(label))
        .unwrap_or_else(|| panic!("missing summary line `{label}` in output: {stdout}"));
    line[label.len()..]
        .trim()
        .parse()
        .unwrap_or_else(|_| panic!("failed parsing count from `{line}`"))
}

#[test]
fn preset_and_scenario_file_agree() {
    let preset = stdout_of(&["--preset", "three_period", "--month", "7"]);
    let file = stdout_of(&["--scenario", "scenarios/three_period.toml", "--month", "7"]);
    assert_eq!(preset, file);
}

#[test]
fn default_run_prints_rows_and_summary() {
    let stdout = stdout_of(&[]);
    assert!(stdout.contains("--- Sweep Summary ---"));
    // January 2024, allocation 60/25/15: 1%..94% plus the forced 100% point.
    assert_eq!(parse_count(&stdout, "Load factors evaluated:"), 95);
    assert_eq!(parse_count(&stdout, "Forced-allocation points:"), 1);
    assert!(stdout.lines().any(|l| l.starts_with("LF=100.0%") && l.ends_with("[forced]")));
}

#[test]
fn annual_seasonal_scenario() {
    let stdout = stdout_of(&["--scenario", "scenarios/seasonal_demand.toml", "--annual"]);
    assert_eq!(parse_count(&stdout, "Load factors evaluated:"), 100);
    assert_eq!(parse_count(&stdout, "Forced-allocation points:"), 0);
}

#[test]
fn exports_rows_and_breakdown() {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR"));
    let rows = dir.join("cli_rows.csv");
    let breakdown = dir.join("cli_breakdown.csv");
    stdout_of(&[
        "--preset",
        "seasonal_demand",
        "--csv-out",
        rows.to_str().unwrap(),
        "--breakdown-out",
        breakdown.to_str().unwrap(),
    ]);

    let rows = std::fs::read_to_string(rows).expect("rows CSV should exist");
    assert_eq!(rows.lines().count(), 101);
    let breakdown = std::fs::read_to_string(breakdown).expect("breakdown CSV should exist");
    let header = breakdown.lines().next().unwrap_or_default();
    assert!(header.starts_with("load_factor,All hours energy (kWh)"));
    assert!(header.contains("Winter demand demand cost"));
}

#[test]
fn invalid_arguments_fail() {
    assert!(!run(&["--preset", "nonexistent"]).status.success());
    assert!(!run(&["--month", "13"]).status.success());
    assert!(!run(&["--scenario", "scenarios/missing.toml"]).status.success());
}
