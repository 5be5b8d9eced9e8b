// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only output log with independent read cursors.
//!
//! One writer side (the job's capture tasks) appends lines; any number of
//! [`LogCursor`]s read them back at their own pace. Entries are never
//! modified or removed once written.
//!
//! Appends, sealing, and the emptiness check a cursor performs before it
//! waits all happen under the same mutex. A waiting cursor registers with the
//! log's [`Notify`] *before* taking that lock, so an append or seal that lands
//! between the check and the wait still wakes it.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct LogState {
    lines: Vec<String>,
    /// No more lines will ever be appended
    sealed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<LogState>,
    changed: Notify,
}

/// Captured output of one job.
///
/// Clones share the same underlying log.
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    shared: Arc<Shared>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line and wake every waiting reader.
    ///
    /// Returns `false` (and drops the line) if the log is already sealed.
    pub fn append(&self, line: impl Into<String>) -> bool {
        {
            let mut state = self.shared.state.lock();
            if state.sealed {
                return false;
            }
            state.lines.push(line.into());
        }
        self.shared.changed.notify_waiters();
        true
    }

    /// Mark end-of-stream. Readers that have consumed every line stop
    /// waiting and observe `None`. Idempotent.
    pub fn seal(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.sealed {
                return;
            }
            state.sealed = true;
        }
        self.shared.changed.notify_waiters();
    }

    pub fn is_sealed(&self) -> bool {
        self.shared.state.lock().sealed
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every line written so far, in append order.
    pub fn snapshot(&self) -> Vec<String> {
        self.shared.state.lock().lines.clone()
    }

    /// A fresh cursor positioned at the first line.
    pub fn reader(&self) -> LogCursor {
        LogCursor {
            log: self.clone(),
            position: 0,
        }
    }

    /// Resolve once the log has been sealed.
    pub async fn sealed(&self) {
        loop {
            let notified = self.shared.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_sealed() {
                return;
            }
            notified.await;
        }
    }
}

/// Outcome of a single non-blocking look at the log.
enum Peek {
    Line(String),
    Empty,
    Ended,
}

/// Per-subscriber read position into an [`OutputLog`].
///
/// Reading never mutates the log, and cursors never affect each other.
#[derive(Debug, Clone)]
pub struct LogCursor {
    log: OutputLog,
    position: usize,
}

impl LogCursor {
    /// Index of the next unread line.
    pub fn position(&self) -> usize {
        self.position
    }

    fn peek(&mut self) -> Peek {
        let state = self.log.shared.state.lock();
        if let Some(line) = state.lines.get(self.position).cloned() {
            self.position += 1;
            Peek::Line(line)
        } else if state.sealed {
            Peek::Ended
        } else {
            Peek::Empty
        }
    }

    /// Return the next line if one is already available. Never waits.
    pub fn try_next(&mut self) -> Option<String> {
        match self.peek() {
            Peek::Line(line) => Some(line),
            Peek::Empty | Peek::Ended => None,
        }
    }

    /// Return the next line, waiting for one to be appended if the cursor
    /// has caught up.
    ///
    /// Returns `None` only once the log is sealed and every line has been
    /// read. Dropping the future cancels the wait.
    pub async fn next_line(&mut self) -> Option<String> {
        let shared = Arc::clone(&self.log.shared);
        loop {
            let notified = shared.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.peek() {
                Peek::Line(line) => return Some(line),
                Peek::Ended => return None,
                Peek::Empty => notified.await,
            }
        }
    }

    /// Read the next line, optionally waiting for it.
    pub async fn read_next(&mut self, blocking: bool) -> Option<String> {
        if blocking {
            self.next_line().await
        } else {
            self.try_next()
        }
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
