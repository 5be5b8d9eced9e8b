//! `jw list`

use crate::prelude::*;

#[test]
fn empty_daemon_has_no_jobs() {
    let temp = Project::empty();
    temp.jw().args(&["daemon", "start"]).passes();

    temp.jw().args(&["list"]).passes().stdout_eq("No jobs\n");
}

#[test]
fn table_lists_every_job() {
    let temp = Project::empty();
    let first = temp.start(&["sleep", "30"]);
    let second = temp.start(&["echo", "hi"]);
    assert!(temp.wait_for_status(&second, "completed"));

    let run = temp.jw().args(&["list"]).passes();
    let stdout = run.stdout();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "stdout: {stdout}");
    assert!(lines[0].starts_with("ID"));
    assert!(stdout.contains(&first));
    assert!(stdout.contains(&second));
    assert!(stdout.contains("running"));
    assert!(stdout.contains("completed"));
}

#[test]
fn json_list_is_an_array() {
    let temp = Project::empty();
    temp.start(&["true"]);
    temp.start(&["true"]);

    let run = temp.jw().args(&["-o", "json", "list"]).passes();
    let json: serde_json::Value = serde_json::from_str(&run.stdout()).unwrap();
    assert_eq!(json.as_array().map(Vec::len), Some(2));
}
