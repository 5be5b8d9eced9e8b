//! Help and version output.

use crate::prelude::*;

#[test]
fn help_lists_every_command() {
    let run = cli().args(&["--help"]).passes();
    for command in ["start", "stop", "status", "log", "list", "daemon"] {
        assert!(
            run.stdout().contains(command),
            "help is missing '{command}':\n{}",
            run.stdout()
        );
    }
}

#[test]
fn no_arguments_prints_help() {
    cli().args(&[]).passes().stdout_has("Usage:");
}

#[test]
fn version_flag_prints_version() {
    cli()
        .args(&["--version"])
        .passes()
        .stdout_has(env!("CARGO_PKG_VERSION"));
}

#[test]
fn daemon_help_lists_subcommands() {
    cli()
        .args(&["daemon", "--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("stop")
        .stdout_has("status")
        .stdout_has("logs");
}
