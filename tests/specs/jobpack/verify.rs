//! Jobpack export and verify specs

use crate::prelude::*;

fn exported(temp: &Project, job_id: &str) -> Value {
    temp.file("linear.yaml", LINEAR_JOBSPEC);
    temp.wrkr()
        .args(&["submit", "linear.yaml", "--job-id", job_id])
        .passes();
    temp.wrkr()
        .args(&["--json", "export", job_id, "--out-dir", "out"])
        .passes()
        .json()
}

#[test]
fn export_footer_names_the_verify_command() {
    let temp = Project::empty();
    let result = exported(&temp, "job_footer");
    let manifest = result["manifest_sha256"].as_str().unwrap();
    similar_asserts::assert_eq!(
        result["footer"].as_str().unwrap(),
        format!("WRKR job_id=job_footer manifest=sha256:{manifest} verify=\"wrkr verify job_footer\"")
    );
}

#[test]
fn verify_by_path_and_by_id_agree() {
    let temp = Project::empty();
    let result = exported(&temp, "job_both");
    let path = result["path"].as_str().unwrap().to_string();

    let by_id = temp
        .wrkr()
        .args(&["--json", "verify", "job_both", "--out-dir", "out"])
        .passes()
        .json();
    let by_path = temp
        .wrkr()
        .args(&["--json", "verify", &path])
        .passes()
        .json();
    assert_eq!(by_id["manifest_sha256"], by_path["manifest_sha256"]);
    assert_eq!(by_id["files_checked"], 7);
}

#[test]
fn verify_text_reports_file_count() {
    let temp = Project::empty();
    exported(&temp, "job_text");
    temp.wrkr()
        .args(&["verify", "job_text", "--out-dir", "out"])
        .passes()
        .stdout_has("verified=job_text files=7");
}

#[test]
fn garbage_archive_fails_with_exit_two() {
    let temp = Project::empty();
    temp.file("out/jobpacks/jobpack_job_junk.zip", "not a zip");
    let run = temp
        .wrkr()
        .args(&["--json", "verify", "job_junk", "--out-dir", "out"])
        .exits(2);
    assert_eq!(run.error()["error"]["code"], "E_VERIFY_HASH_MISMATCH");
}

#[test]
fn export_leaves_the_job_untouched() {
    let temp = Project::empty();
    exported(&temp, "job_same");
    let run = temp.wrkr().args(&["status", "job_same"]).passes();
    assert_eq!(run.stdout().lines().count(), 1);
    run.stdout_has("job_id=job_same status=completed checkpoints=4 steps=2/2");
}
