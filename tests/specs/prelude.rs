//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for driving the jw CLI against an isolated daemon.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// Aggressive timeouts for fast tests.
const JW_TIMEOUT_CONNECT_MS: &str = "2000";
const JW_TIMEOUT_EXIT_MS: &str = "500";
const JW_TIMEOUT_IPC_MS: &str = "1000";
const JW_CONNECT_POLL_MS: &str = "5";
// Read by the daemon, which inherits the CLI's environment
const JW_STOP_GRACE_MS: &str = "300";
const JW_DRAIN_TIMEOUT_MS: &str = "500";

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 3000;

/// Path to a workspace binary, with a fallback next to the test executable.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // target/debug/deps/specs-<hash> -> target/debug/
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn jw_binary() -> PathBuf {
    binary_path("jw")
}

pub fn jwd_binary() -> PathBuf {
    binary_path("jwd")
}

/// Create a CLI builder for jw commands
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// Fluent builder for one jw invocation
pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
            envs: vec![
                (
                    "JW_DAEMON_BINARY".into(),
                    jwd_binary().to_string_lossy().into(),
                ),
                ("JW_TIMEOUT_CONNECT_MS".into(), JW_TIMEOUT_CONNECT_MS.into()),
                ("JW_TIMEOUT_EXIT_MS".into(), JW_TIMEOUT_EXIT_MS.into()),
                ("JW_TIMEOUT_IPC_MS".into(), JW_TIMEOUT_IPC_MS.into()),
                ("JW_CONNECT_POLL_MS".into(), JW_CONNECT_POLL_MS.into()),
                ("JW_STOP_GRACE_MS".into(), JW_STOP_GRACE_MS.into()),
                ("JW_DRAIN_TIMEOUT_MS".into(), JW_DRAIN_TIMEOUT_MS.into()),
            ],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Build the command without running it
    pub fn command(self) -> Command {
        let mut cmd = Command::new(jw_binary());
        cmd.args(&self.args);
        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run without asserting on the outcome
    pub fn run(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        RunAssert { output }
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let run = self.run();
        assert!(
            run.output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            run.output.status.code(),
            run.stdout(),
            run.stderr()
        );
        run
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let run = self.run();
        assert!(
            !run.output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            run.stdout(),
            run.stderr()
        );
        run
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    /// Assert the exit code.
    pub fn exits_with(self, code: i32) -> Self {
        assert_eq!(
            self.code(),
            Some(code),
            "unexpected exit code\nstdout: {}\nstderr: {}",
            self.stdout(),
            self.stderr()
        );
        self
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stderr_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stderr(), expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }

    /// Id printed by `jw start`.
    pub fn job_id(&self) -> String {
        parse_job_id(&self.stdout())
    }
}

/// Id from a `Started job <id>` line.
pub fn parse_job_id(stdout: &str) -> String {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Started job "))
        .map(|id| id.trim().to_string())
        .unwrap_or_else(|| panic!("no 'Started job' line in: {stdout}"))
}

// =============================================================================
// Polling
// =============================================================================

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Project
// =============================================================================

/// Working directory plus an isolated daemon state directory.
pub struct Project {
    dir: tempfile::TempDir,
    state_dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            state_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    /// Write a file at the given path (parent directories created automatically)
    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        let full_path = self.dir.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full_path, content).unwrap();
    }

    /// Run jw in this project's context
    pub fn jw(&self) -> CliBuilder {
        cli()
            .pwd(self.path())
            .env("JW_STATE_DIR", self.state_path())
    }

    /// Start a job and return its id.
    pub fn start(&self, command: &[&str]) -> String {
        let mut args = vec!["start"];
        args.extend_from_slice(command);
        self.jw().args(&args).passes().job_id()
    }

    /// Current status word of a job, from `jw status -o json`.
    pub fn status_of(&self, id: &str) -> String {
        let run = self.jw().args(&["-o", "json", "status", id]).passes();
        let json: serde_json::Value = serde_json::from_str(&run.stdout()).unwrap();
        json["status"].as_str().unwrap_or_default().to_string()
    }

    /// Poll until the job reports `status`.
    pub fn wait_for_status(&self, id: &str, status: &str) -> bool {
        wait_for(SPEC_WAIT_MAX_MS, || self.status_of(id) == status)
    }

    /// Poll until the job's exit has been recorded.
    ///
    /// A stopped job reports `terminated` before its process is reaped.
    pub fn wait_finished(&self, id: &str) -> bool {
        wait_for(SPEC_WAIT_MAX_MS, || {
            let run = self.jw().args(&["-o", "json", "status", id]).passes();
            let json: serde_json::Value = serde_json::from_str(&run.stdout()).unwrap();
            json.get("finished_at_ms").is_some()
        })
    }

    pub fn daemon_log(&self) -> String {
        let log_path = self.state_path().join("daemon.log");
        std::fs::read_to_string(&log_path).unwrap_or_else(|_| "(no daemon log)".to_string())
    }

    pub fn daemon_pid(&self) -> Option<u32> {
        std::fs::read_to_string(self.state_path().join("daemon.pid"))
            .ok()
            .and_then(|content| content.trim().parse().ok())
    }

    /// Kill the daemon with SIGKILL (simulates a crash).
    pub fn daemon_kill(&self) -> bool {
        self.daemon_pid().is_some_and(|pid| send_signal(pid, "-9"))
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        let mut cmd = self.jw().args(&["daemon", "stop", "--kill"]).command();
        cmd.stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        let _ = cmd.status();
    }
}

/// `kill <signal> <pid>`; true if it was delivered.
pub fn send_signal(pid: u32, signal: &str) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn process_exists(pid: u32) -> bool {
    send_signal(pid, "-0")
}
