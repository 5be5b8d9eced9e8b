//! Daemon start, stop, status, and crash recovery.

use crate::prelude::*;

#[test]
fn status_when_not_running() {
    let temp = Project::empty();
    temp.jw()
        .args(&["daemon", "status"])
        .passes()
        .stdout_eq("Daemon not running\n");
}

#[test]
fn status_json_when_not_running() {
    let temp = Project::empty();
    let run = temp.jw().args(&["-o", "json", "daemon", "status"]).passes();
    let json: serde_json::Value = serde_json::from_str(&run.stdout()).unwrap();
    assert_eq!(json["status"], "not_running");
}

#[test]
fn start_status_stop() {
    let temp = Project::empty();

    temp.jw()
        .args(&["daemon", "start"])
        .passes()
        .stdout_eq("Daemon started\n");
    temp.jw()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Status: running")
        .stdout_has("Jobs: 0 running, 0 total");
    temp.jw()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_eq("Daemon stopped\n");
    temp.jw()
        .args(&["daemon", "status"])
        .passes()
        .stdout_eq("Daemon not running\n");
}

#[test]
fn second_start_reports_already_running() {
    let temp = Project::empty();
    temp.jw().args(&["daemon", "start"]).passes();
    temp.jw()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon already running");
}

#[test]
fn stop_when_not_running() {
    let temp = Project::empty();
    temp.jw()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_eq("Daemon not running\n");
}

#[test]
fn job_start_launches_daemon() {
    let temp = Project::empty();
    temp.start(&["true"]);

    assert!(temp.daemon_pid().is_some());
    temp.jw()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Jobs: ");
}

#[test]
fn daemon_files_are_removed_on_stop() {
    let temp = Project::empty();
    temp.jw().args(&["daemon", "start"]).passes();
    assert!(temp.state_path().join("daemon.sock").exists());

    temp.jw().args(&["daemon", "stop"]).passes();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        !temp.state_path().join("daemon.sock").exists()
            && !temp.state_path().join("daemon.pid").exists()
    }));
}

#[test]
fn stop_kill_terminates_running_jobs() {
    let temp = Project::empty();
    let id = temp.start(&["sleep", "30"]);

    let run = temp.jw().args(&["-o", "json", "status", &id]).passes();
    let json: serde_json::Value = serde_json::from_str(&run.stdout()).unwrap();
    let pid = json["pid"].as_u64().unwrap() as u32;
    assert!(process_exists(pid));

    temp.jw().args(&["daemon", "stop", "--kill"]).passes();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || !process_exists(pid)));
}

#[test]
fn recovers_after_daemon_crash() {
    let temp = Project::empty();
    temp.jw().args(&["daemon", "start"]).passes();
    let old_pid = temp.daemon_pid().unwrap();

    assert!(temp.daemon_kill());
    assert!(wait_for(SPEC_WAIT_MAX_MS, || !process_exists(old_pid)));

    // Stale socket and pid file are cleaned up on the next start
    let id = temp.start(&["echo", "again"]);
    assert!(temp.wait_for_status(&id, "completed"));
    assert_ne!(temp.daemon_pid(), Some(old_pid));
}

#[test]
fn restart_replaces_the_process() {
    let temp = Project::empty();
    temp.jw().args(&["daemon", "start"]).passes();
    let old_pid = temp.daemon_pid().unwrap();

    temp.jw()
        .args(&["daemon", "restart"])
        .passes()
        .stdout_eq("Daemon restarted\n");
    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        temp.daemon_pid().is_some_and(|pid| pid != old_pid)
    }));
}
