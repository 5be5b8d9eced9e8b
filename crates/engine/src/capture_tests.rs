// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const DONE: Duration = Duration::from_secs(2);

fn running() -> (watch::Sender<JobStatus>, watch::Receiver<JobStatus>) {
    watch::channel(JobStatus::Running)
}

#[tokio::test]
async fn splits_on_newline_and_keeps_partial_tail() {
    let log = OutputLog::new();
    let (_tx, rx) = running();
    let input: &[u8] = b"first\nsecond\ntail";

    let handle = spawn(JobId::new("j"), Stream::Stdout, input, log.clone(), rx);
    tokio::time::timeout(DONE, handle).await.unwrap().unwrap();

    assert_eq!(log.snapshot(), vec!["first\n", "second\n", "tail"]);
}

#[tokio::test]
async fn invalid_utf8_is_replaced() {
    let log = OutputLog::new();
    let (_tx, rx) = running();
    let input: &[u8] = b"ok \xff\xfe\n";

    let handle = spawn(JobId::new("j"), Stream::Stderr, input, log.clone(), rx);
    tokio::time::timeout(DONE, handle).await.unwrap().unwrap();

    assert_eq!(log.snapshot(), vec!["ok \u{fffd}\u{fffd}\n"]);
}

#[tokio::test]
async fn stops_reading_once_job_is_terminated() {
    let log = OutputLog::new();
    let (tx, rx) = running();
    let (mut writer, reader) = tokio::io::duplex(64);

    let handle = spawn(JobId::new("j"), Stream::Stdout, reader, log.clone(), rx);
    writer.write_all(b"before\n").await.unwrap();
    tokio::time::timeout(DONE, async {
        while log.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    tx.send_replace(JobStatus::Terminated);
    tokio::time::timeout(DONE, handle).await.unwrap().unwrap();

    // Writer is still open; the task ended because of the stop.
    let _ = writer.write_all(b"after\n").await;
    assert_eq!(log.snapshot(), vec!["before\n"]);
}

#[tokio::test]
async fn natural_completion_does_not_cut_capture_short() {
    let log = OutputLog::new();
    let (tx, rx) = running();
    tx.send_replace(JobStatus::Completed);
    let input: &[u8] = b"a\nb\n";

    let handle = spawn(JobId::new("j"), Stream::Stdout, input, log.clone(), rx);
    tokio::time::timeout(DONE, handle).await.unwrap().unwrap();

    assert_eq!(log.snapshot(), vec!["a\n", "b\n"]);
}
