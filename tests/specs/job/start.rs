//! `jw start`

use crate::prelude::*;

#[test]
fn output_is_available_after_completion() {
    let temp = Project::empty();
    let id = temp.start(&["echo", "Hello", "World"]);

    assert!(temp.wait_for_status(&id, "completed"));
    assert!(temp.wait_finished(&id));
    temp.jw()
        .args(&["log", &id])
        .passes()
        .stdout_eq("Hello World\n");
}

#[test]
fn started_job_is_reported_running_with_pid() {
    let temp = Project::empty();
    let id = temp.start(&["sleep", "30"]);

    temp.jw()
        .args(&["status", &id])
        .passes()
        .stdout_has(&format!("Job {id}: running"))
        .stdout_has("  PID: ")
        .stdout_has("  Command: sleep 30");
}

#[test]
fn wait_streams_output_and_mirrors_exit_code() {
    let temp = Project::empty();
    let run = temp
        .jw()
        .args(&["start", "--wait", "sh", "-c", "echo out; exit 3"])
        .fails()
        .exits_with(3);

    let stdout = run.stdout();
    assert!(stdout.starts_with("Started job "), "stdout: {stdout}");
    assert!(stdout.ends_with("out\n"), "stdout: {stdout}");
}

#[test]
fn wait_on_success_exits_zero() {
    let temp = Project::empty();
    temp.jw()
        .args(&["start", "-w", "echo", "done"])
        .passes()
        .stdout_has("done\n");
}

#[test]
fn json_output_has_id() {
    let temp = Project::empty();
    let run = temp
        .jw()
        .args(&["-o", "json", "start", "true"])
        .passes();
    let json: serde_json::Value = serde_json::from_str(&run.stdout()).unwrap();
    let id = json["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert!(temp.wait_for_status(id, "completed"));
}

#[test]
fn job_gets_extra_env() {
    let temp = Project::empty();
    temp.jw()
        .args(&["start", "-w", "-e", "JW_SPEC_VALUE=hello", "sh", "-c", "echo $JW_SPEC_VALUE"])
        .passes()
        .stdout_has("hello\n");
}

#[test]
fn job_runs_in_callers_directory() {
    let temp = Project::empty();
    let run = temp.jw().args(&["start", "-w", "pwd", "-P"]).passes();

    let expected = std::fs::canonicalize(temp.path()).unwrap();
    let last = run.stdout().lines().last().unwrap_or_default().to_string();
    assert_eq!(last, expected.to_string_lossy());
}

#[test]
fn stdout_and_stderr_are_both_captured() {
    let temp = Project::empty();
    let id = temp.start(&["sh", "-c", "echo to-out; echo to-err >&2"]);
    assert!(temp.wait_for_status(&id, "completed"));
    assert!(temp.wait_finished(&id));

    temp.jw()
        .args(&["log", &id])
        .passes()
        .stdout_has("to-out\n")
        .stdout_has("to-err\n");
}

#[test]
fn nonzero_exit_is_failed() {
    let temp = Project::empty();
    let id = temp.start(&["sh", "-c", "exit 7"]);

    assert!(temp.wait_for_status(&id, "failed"));
    assert!(temp.wait_finished(&id));
    temp.jw()
        .args(&["status", &id])
        .passes()
        .stdout_has("  Exit code: 7");
}
