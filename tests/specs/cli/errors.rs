//! Error reporting specs
//!
//! Failures print `error: ...` on stderr, or the JSON envelope with
//! `--json`, and exit with the code mapped from the error.

use crate::prelude::*;

#[test]
fn unknown_job_text_error() {
    let temp = Project::empty();
    temp.wrkr()
        .args(&["status", "job_nope"])
        .exits(6)
        .stderr_has("error: job not found: job_nope (E_JOB_NOT_FOUND)")
        .stderr_has("wrkr status");
}

#[test]
fn unknown_job_json_envelope() {
    let temp = Project::empty();
    let run = temp
        .wrkr()
        .args(&["--json", "checkpoint", "list", "job_nope"])
        .exits(6);
    let error = run.error();
    assert_eq!(error["error"]["code"], "E_JOB_NOT_FOUND");
    assert_eq!(error["error"]["exit_code"], 6);
    assert_eq!(error["error"]["details"]["job_id"], "job_nope");
    assert!(run.stdout().is_empty());
}

#[test]
fn invalid_job_id_is_rejected() {
    let temp = Project::empty();
    temp.wrkr().args(&["status", "../etc"]).exits(6);
}

#[test]
fn malformed_config_file_fails() {
    let temp = Project::empty();
    temp.file("wrkr.toml", "[engine]\nunknown_key = 1\n");
    temp.wrkr()
        .args(&["--config", "wrkr.toml", "status"])
        .exits(6)
        .stderr_has("wrkr.toml");
}

#[test]
fn missing_jobspec_file_fails() {
    let temp = Project::empty();
    temp.wrkr()
        .args(&["submit", "missing.yaml"])
        .exits(6)
        .stderr_has("missing.yaml");
}

#[test]
fn non_loopback_serve_is_unsafe() {
    let temp = Project::empty();
    let run = temp
        .wrkr()
        .args(&["--json", "serve", "--listen", "0.0.0.0:0"])
        .exits(8);
    assert_eq!(run.error()["error"]["code"], "E_UNSAFE_OPERATION");
}
