//! Help and version specs

use crate::prelude::*;

#[test]
fn help_lists_every_command() {
    let temp = Project::empty();
    let run = temp.wrkr().args(&["--help"]).passes();
    for command in [
        "init", "submit", "status", "checkpoint", "approve", "resolve", "resume", "cancel", "export",
        "verify", "job", "budget", "store", "accept", "serve", "demo", "doctor",
    ] {
        assert!(
            run.stdout().lines().any(|l| l.trim_start().starts_with(command)),
            "help is missing {command}"
        );
    }
}

#[test]
fn version_prints_binary_name() {
    let temp = Project::empty();
    temp.wrkr().args(&["--version"]).passes().stdout_has("wrkr");
}

#[test]
fn accept_help_lists_subcommands() {
    let temp = Project::empty();
    temp.wrkr()
        .args(&["accept", "--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("init");
}

#[test]
fn job_help_lists_subcommands() {
    let temp = Project::empty();
    temp.wrkr()
        .args(&["job", "--help"])
        .passes()
        .stdout_has("inspect")
        .stdout_has("diff");
}
