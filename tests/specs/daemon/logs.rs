//! `jw daemon logs` and startup failure reporting.

use crate::prelude::*;

#[test]
fn no_log_before_first_start() {
    let temp = Project::empty();
    temp.jw()
        .args(&["daemon", "logs"])
        .passes()
        .stdout_has("No log file found at");
}

#[test]
fn log_has_startup_marker_and_ready_line() {
    let temp = Project::empty();
    temp.jw().args(&["daemon", "start"]).passes();

    assert!(wait_for(SPEC_WAIT_MAX_MS, || temp
        .daemon_log()
        .contains("Daemon ready")));
    temp.jw()
        .args(&["daemon", "logs", "--no-limit"])
        .passes()
        .stdout_has("--- jwd: starting (pid: ")
        .stdout_has("Daemon ready");
}

#[test]
fn limit_trims_to_last_lines() {
    let temp = Project::empty();
    temp.jw().args(&["daemon", "start"]).passes();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || temp
        .daemon_log()
        .contains("Daemon ready")));

    let run = temp.jw().args(&["daemon", "logs", "-n", "1"]).passes();
    assert_eq!(run.stdout().lines().count(), 1, "stdout: {}", run.stdout());
}

#[test]
fn invalid_config_fails_startup() {
    let temp = Project::empty();
    std::fs::write(
        temp.state_path().join("config.toml"),
        "[jobs]\nstop_grace_ms = \"soon\"\n",
    )
    .unwrap();

    temp.jw()
        .args(&["daemon", "start"])
        .fails()
        .stderr_has("Failed to start daemon");
    assert!(temp.daemon_log().contains("Invalid config file"));
}

#[test]
fn job_lifecycle_is_logged() {
    let temp = Project::empty();
    let id = temp.start(&["true"]);
    assert!(temp.wait_for_status(&id, "completed"));

    assert!(wait_for(SPEC_WAIT_MAX_MS, || temp.daemon_log().contains(&id)));
}
