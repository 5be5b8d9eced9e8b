// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Relative age of an epoch timestamp, e.g. `"4.2s"`; `"-"` when unset.
pub fn format_time_ago(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    jw_core::format_ago(epoch_ms, jw_core::epoch_ms())
}

/// Print job output exactly as captured, ending on a newline.
pub fn print_output(output: &str) {
    print!("{}", output);
    if !output.is_empty() && !output.ends_with('\n') {
        println!();
    }
}

/// Show a log file's tail, optionally following it until Ctrl-C.
pub async fn display_log(
    log_path: &Path,
    content: &str,
    follow: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            if content.is_empty() {
                eprintln!("No log entries found in {}", log_path.display());
            } else {
                print_output(content);
            }
            if follow {
                tail_file(log_path).await?;
            }
        }
        OutputFormat::Json => {
            print_json(&serde_json::json!({
                "log_path": log_path.to_string_lossy(),
                "lines": content.lines().collect::<Vec<_>>(),
            }))?;
            if follow {
                eprintln!("warning: --follow is not supported with --output json");
            }
        }
    }
    Ok(())
}

/// Print lines appended to `path` as they arrive, until Ctrl-C.
pub async fn tail_file(path: &Path) -> anyhow::Result<()> {
    use notify::{Event, EventKind, RecursiveMode, Watcher};
    use std::io::{BufRead, BufReader, Seek, SeekFrom};

    let mut file = std::fs::File::open(path)
        .map_err(|_| anyhow::anyhow!("Log file not found: {}", path.display()))?;
    // The caller already printed what is there
    file.seek(SeekFrom::End(0))?;
    let mut reader = BufReader::new(file);

    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Modify(_)) {
                let _ = tx.blocking_send(());
            }
        }
    })?;
    let watch_dir = path.parent().unwrap_or(path);
    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            print!("{}", line);
            line.clear();
        }
        tokio::select! {
            _ = rx.recv() => {}
            _ = &mut ctrl_c => break,
        }
    }
    Ok(())
}

/// Last `n` lines of a file, joined with newlines.
pub fn read_last_lines(path: &Path, n: usize) -> anyhow::Result<String> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
