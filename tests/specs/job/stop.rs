//! `jw stop`

use crate::prelude::*;

#[test]
fn stop_interrupts_running_job() {
    let temp = Project::empty();
    let id = temp.start(&["sleep", "30"]);

    temp.jw()
        .args(&["stop", &id])
        .passes()
        .stdout_eq(&format!("Stopped job {id}\n"));

    assert!(temp.wait_for_status(&id, "terminated"));
    assert!(temp.wait_finished(&id));
    temp.jw()
        .args(&["status", &id])
        .passes()
        .stdout_has("  Signal: 2");
}

#[test]
fn second_stop_is_rejected() {
    let temp = Project::empty();
    let id = temp.start(&["sleep", "30"]);

    temp.jw().args(&["stop", &id]).passes();
    assert!(temp.wait_for_status(&id, "terminated"));
    temp.jw().args(&["stop", &id]).fails().exits_with(4);
}

#[test]
fn job_ignoring_interrupt_is_killed_after_grace() {
    let temp = Project::empty();
    // Ignored signals are inherited, so nothing in the group reacts to SIGINT
    let id = temp.start(&["sh", "-c", "trap '' INT; while true; do sleep 0.1; done"]);

    temp.jw().args(&["stop", &id]).passes();
    assert!(temp.wait_for_status(&id, "terminated"));
    assert!(temp.wait_finished(&id));
    temp.jw()
        .args(&["status", &id])
        .passes()
        .stdout_has("  Signal: 9");
}

#[test]
fn stopped_job_keeps_its_output() {
    let temp = Project::empty();
    let id = temp.start(&["sh", "-c", "echo before; sleep 30"]);

    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        temp.jw().args(&["log", &id]).passes().stdout().contains("before")
    }));
    temp.jw().args(&["stop", &id]).passes();
    assert!(temp.wait_finished(&id));
    temp.jw()
        .args(&["log", &id])
        .passes()
        .stdout_eq("before\n");
}
