// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for export, verify, accept and demo

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use common::{error_envelope, Env, SIMPLE_JOBSPEC};
use predicates::prelude::*;
use std::fs;

#[test]
fn export_then_verify_by_job_id() {
    let env = Env::new();
    env.submit("job_pack", SIMPLE_JOBSPEC);

    let exported = env.json(&["export", "job_pack", "--out-dir", "out"]);
    let path = env.path().join("out/jobpacks/jobpack_job_pack.zip");
    assert!(path.is_file());
    let manifest = exported["manifest_sha256"].as_str().unwrap();
    assert_eq!(manifest.len(), 64);
    assert_eq!(
        exported["footer"],
        format!("WRKR job_id=job_pack manifest=sha256:{manifest} verify=\"wrkr verify job_pack\"")
    );

    let report = env.json(&["verify", "job_pack", "--out-dir", "out"]);
    assert_eq!(report["job_id"], "job_pack");
    assert_eq!(report["manifest_sha256"], manifest);
    assert_eq!(report["reproducible"], true);
}

#[test]
fn export_text_prints_footer() {
    let env = Env::new();
    env.submit("job_footer", SIMPLE_JOBSPEC);

    env.wrkr()
        .args(["export", "job_footer", "--out-dir", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jobpack="))
        .stdout(predicate::str::contains("WRKR job_id=job_footer manifest=sha256:"));
}

#[test]
fn re_export_is_byte_identical() {
    let env = Env::new();
    env.submit("job_same", SIMPLE_JOBSPEC);
    let path = env.path().join("out/jobpacks/jobpack_job_same.zip");

    env.json(&["export", "job_same", "--out-dir", "out"]);
    let first = fs::read(&path).unwrap();
    env.json(&["export", "job_same", "--out-dir", "out"]);
    assert_eq!(first, fs::read(&path).unwrap());
}

#[test]
fn verify_rejects_a_damaged_archive() {
    let env = Env::new();
    env.submit("job_damaged", SIMPLE_JOBSPEC);
    env.json(&["export", "job_damaged", "--out-dir", "out"]);

    let path = env.path().join("out/jobpacks/jobpack_job_damaged.zip");
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 16]).unwrap();

    let out = env
        .wrkr()
        .args(["--json", "verify"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert_eq!(
        error_envelope(&out.stderr)["error"]["code"],
        "E_VERIFY_HASH_MISMATCH"
    );
}

#[test]
fn verify_of_missing_archive_suggests_export() {
    let env = Env::new();
    env.wrkr()
        .args(["verify", "job_never", "--out-dir", "out"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("wrkr export"));
}

#[test]
fn accept_passes_with_default_config() {
    let env = Env::new();
    env.submit("job_ok", SIMPLE_JOBSPEC);

    let result = env.json(&["accept", "run", "job_ok"]);
    assert_eq!(result["passed"], true);
    assert_eq!(result["schema_id"], "wrkr.accept_result");
    assert!(env.job_dir("job_ok").join("accept_result.json").is_file());
}

#[test]
fn accept_reports_missing_artifact() {
    let env = Env::new();
    env.submit("job_missing_art", SIMPLE_JOBSPEC);
    env.file(
        "accept.yaml",
        "required_artifacts: [reports/demo.md]\n",
    );

    let out = env
        .wrkr()
        .args(["--json", "accept", "run", "job_missing_art", "--ci"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(5));
    let envelope = error_envelope(&out.stderr);
    assert_eq!(envelope["error"]["code"], "E_ACCEPT_MISSING_ARTIFACT");
    assert_eq!(
        envelope["error"]["details"]["failures"][0]["artifact"],
        "reports/demo.md"
    );

    let stdout: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(stdout["passed"], false);

    let dir = env.job_dir("job_missing_art");
    let saved: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.join("accept_result.json")).unwrap()).unwrap();
    assert_eq!(saved["passed"], false);
    let junit = fs::read_to_string(dir.join("accept.junit.xml")).unwrap();
    assert!(junit.contains("<failure"));
}

#[test]
fn accept_with_missing_explicit_config_fails() {
    let env = Env::new();
    env.submit("job_cfg", SIMPLE_JOBSPEC);

    env.wrkr()
        .args(["accept", "run", "job_cfg", "--config", "nope.yaml"])
        .assert()
        .code(6);
}

#[test]
fn accept_result_is_packaged() {
    let env = Env::new();
    env.submit("job_packaged", SIMPLE_JOBSPEC);
    env.json(&["accept", "run", "job_packaged"]);
    env.json(&["export", "job_packaged", "--out-dir", "out"]);

    let report = env.json(&["verify", "job_packaged", "--out-dir", "out"]);
    assert_eq!(report["files_checked"], 8);
}

#[test]
fn accept_init_writes_a_loadable_config() {
    let env = Env::new();
    env.wrkr().args(["accept", "init"]).assert().success();
    assert!(env.path().join("accept.yaml").is_file());

    env.submit("job_init_cfg", SIMPLE_JOBSPEC);
    let result = env.json(&["accept", "run", "job_init_cfg"]);
    assert_eq!(result["passed"], true);
}

#[test]
fn demo_completes_and_verifies() {
    let env = Env::new();
    let out = env.json(&["demo", "--out-dir", "out"]);

    let job_id = out["job_id"].as_str().unwrap();
    assert!(job_id.starts_with("job_demo_"));
    assert_eq!(out["status"], "completed");
    assert!(env
        .path()
        .join(format!("out/jobpacks/jobpack_{job_id}.zip"))
        .is_file());
    assert!(out["footer"].as_str().unwrap().starts_with("WRKR job_id="));
}
