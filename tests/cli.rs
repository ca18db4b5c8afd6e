use std::io::Write;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

const INTERRUPT_ENV: &str = "SHARED_SLOTS_INTERRUPT_BEFORE_WAIT";

fn command(args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_shared-slots"));
    command
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove(INTERRUPT_ENV);
    command
}

fn run(args: &[&str]) -> Output {
    command(args).output().expect("failed to launch shared-slots")
}

fn run_interrupted(args: &[&str]) -> Output {
    command(args)
        .env(INTERRUPT_ENV, "1")
        .output()
        .expect("failed to launch shared-slots")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

fn sorted(mut lines: Vec<String>) -> Vec<String> {
    lines.sort();
    lines
}

#[test]
fn default_run_prints_one_line_per_slot() {
    let output = run(&[]);

    assert!(output.status.success());
    assert_eq!(
        sorted(stdout_lines(&output)),
        vec!["myValue[0] = 0", "myValue[1] = 1", "myValue[2] = 2"]
    );
}

#[test]
fn workers_flag_sets_slot_count() {
    let output = run(&["--workers", "5"]);

    assert!(output.status.success());
    let lines = sorted(stdout_lines(&output));
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[4], "myValue[4] = 4");
}

#[test]
fn config_file_is_honoured() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "workers = 2").unwrap();

    let output = run(&["--config", file.path().to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(
        sorted(stdout_lines(&output)),
        vec!["myValue[0] = 0", "myValue[1] = 1"]
    );
}

#[test]
fn interrupted_wait_prints_diagnostic_and_exits_cleanly() {
    let output = run_interrupted(&[]);

    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 4);
    // Every worker is joined before the diagnostic, and the count says so.
    assert_eq!(
        sorted(lines[..3].to_vec()),
        vec!["myValue[0] = 0", "myValue[1] = 1", "myValue[2] = 2"]
    );
    assert_eq!(lines[3], "wait interrupted: 3 of 3 workers completed");
}

#[test]
fn strict_mode_reports_interruption_in_exit_status() {
    let output = run_interrupted(&["--strict"]);

    assert_eq!(output.status.code(), Some(130));
}

#[test]
fn interrupt_flag_is_not_part_of_the_cli() {
    let output = run(&["--inject-interrupt"]);

    assert!(!output.status.success());
    assert!(stdout_lines(&output).is_empty());
}

#[test]
fn zero_workers_is_rejected() {
    let output = run(&["--workers", "0"]);

    assert!(!output.status.success());
    assert!(stdout_lines(&output).is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("out of range"));
}
