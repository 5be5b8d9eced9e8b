//! Error reporting and exit codes.

use crate::prelude::*;

#[test]
fn start_without_command_is_a_usage_error() {
    let temp = Project::empty();
    temp.jw().args(&["start"]).fails().exits_with(2);
}

#[test]
fn unknown_job_exits_not_found() {
    let temp = Project::empty();
    temp.start(&["true"]);

    temp.jw()
        .args(&["status", "no-such-job"])
        .fails()
        .exits_with(3)
        .stderr_eq("Error: job not found: no-such-job\n");
    temp.jw()
        .args(&["log", "no-such-job"])
        .fails()
        .exits_with(3);
}

#[test]
fn query_without_daemon_does_not_start_one() {
    let temp = Project::empty();
    temp.jw()
        .args(&["list"])
        .fails()
        .stderr_has("Daemon not running");
    assert!(temp.daemon_pid().is_none());
}

#[test]
fn stopping_a_finished_job_exits_not_running() {
    let temp = Project::empty();
    let id = temp.start(&["true"]);
    assert!(temp.wait_for_status(&id, "completed"));

    temp.jw()
        .args(&["stop", &id])
        .fails()
        .exits_with(4)
        .stderr_has("not running");
}

#[test]
fn missing_binary_reports_spawn_failure() {
    let temp = Project::empty();
    temp.jw()
        .args(&["start", "/definitely/not/a/binary"])
        .fails()
        .exits_with(1)
        .stderr_has("failed to start '/definitely/not/a/binary'");
}
