//! `jw log`

use std::process::Stdio;

use crate::prelude::*;

#[test]
fn follow_streams_until_job_ends() {
    let temp = Project::empty();
    let id = temp.start(&["sh", "-c", "sleep 0.2; echo one; sleep 0.2; echo two"]);

    temp.jw()
        .args(&["log", &id, "--follow"])
        .passes()
        .stdout_eq("one\ntwo\n");
}

#[test]
fn concurrent_followers_see_the_same_output() {
    let temp = Project::empty();
    let id = temp.start(&["sh", "-c", "sleep 0.3; for i in 1 2 3 4 5; do echo line-$i; done"]);

    let spawn_follower = || {
        let mut cmd = temp.jw().args(&["log", "-f", &id]).command();
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.spawn().unwrap()
    };
    let first = spawn_follower();
    let second = spawn_follower();

    let first = first.wait_with_output().unwrap();
    let second = second.wait_with_output().unwrap();
    assert!(first.status.success());
    assert!(second.status.success());

    let expected = "line-1\nline-2\nline-3\nline-4\nline-5\n";
    assert_eq!(String::from_utf8_lossy(&first.stdout), expected);
    assert_eq!(String::from_utf8_lossy(&second.stdout), expected);
}

#[test]
fn follow_on_finished_job_replays_and_exits() {
    let temp = Project::empty();
    let id = temp.start(&["printf", "a\\nb\\n"]);
    assert!(temp.wait_for_status(&id, "completed"));
    assert!(temp.wait_finished(&id));

    temp.jw()
        .args(&["log", "--follow", &id])
        .passes()
        .stdout_eq("a\nb\n");
}

#[test]
fn json_log_wraps_output() {
    let temp = Project::empty();
    let id = temp.start(&["echo", "hi"]);
    assert!(temp.wait_for_status(&id, "completed"));
    assert!(temp.wait_finished(&id));

    let run = temp.jw().args(&["-o", "json", "log", &id]).passes();
    let json: serde_json::Value = serde_json::from_str(&run.stdout()).unwrap();
    assert_eq!(json["id"], id.as_str());
    assert_eq!(json["output"], "hi\n");
}
