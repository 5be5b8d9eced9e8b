// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable durations for job listings.

/// Format a duration in milliseconds: `"850ms"`, `"4.2s"`, `"3m07s"`, `"2h05m"`, `"3d4h"`.
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1_000 {
        return format!("{ms}ms");
    }
    if ms < 60_000 {
        return format!("{:.1}s", ms as f64 / 1_000.0);
    }
    let secs = ms / 1_000;
    if secs < 3_600 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else if secs < 86_400 {
        format!("{}h{:02}m", secs / 3_600, (secs % 3_600) / 60)
    } else {
        format!("{}d{}h", secs / 86_400, (secs % 86_400) / 3_600)
    }
}

/// How long ago `then_ms` was, relative to `now_ms`. Future times read as `"0ms"`.
pub fn format_ago(then_ms: u64, now_ms: u64) -> String {
    format_duration_ms(now_ms.saturating_sub(then_ms))
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
