//! Checkpoint trail specs

use crate::prelude::*;

fn submit_linear(temp: &Project, job_id: &str) {
    temp.file("linear.yaml", LINEAR_JOBSPEC);
    temp.wrkr()
        .args(&["submit", "linear.yaml", "--job-id", job_id])
        .passes();
}

#[test]
fn trail_is_plan_progress_completed() {
    let temp = Project::empty();
    submit_linear(&temp, "job_trail");

    let checkpoints = temp
        .wrkr()
        .args(&["--json", "checkpoint", "list", "job_trail"])
        .passes()
        .json();
    let trail: Vec<String> = checkpoints
        .as_array()
        .unwrap()
        .iter()
        .map(|cp| match cp["step_id"].as_str() {
            Some(step) => format!("{}({step})", cp["type"].as_str().unwrap()),
            None => cp["type"].as_str().unwrap().to_string(),
        })
        .collect();
    similar_asserts::assert_eq!(
        trail,
        vec!["plan", "progress(prepare)", "progress(write)", "completed"]
    );
}

#[test]
fn checkpoint_ids_strictly_increase() {
    let temp = Project::empty();
    submit_linear(&temp, "job_ids");

    let checkpoints = temp
        .wrkr()
        .args(&["--json", "checkpoint", "list", "job_ids"])
        .passes()
        .json();
    let seqs: Vec<u64> = checkpoints
        .as_array()
        .unwrap()
        .iter()
        .map(|cp| {
            cp["checkpoint_id"]
                .as_str()
                .unwrap()
                .trim_start_matches("cp_")
                .parse()
                .unwrap()
        })
        .collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]), "{seqs:?}");
}

#[test]
fn plan_checkpoint_carries_the_jobspec() {
    let temp = Project::empty();
    submit_linear(&temp, "job_plan");

    let checkpoints = temp
        .wrkr()
        .args(&["--json", "checkpoint", "list", "job_plan"])
        .passes()
        .json();
    let plan = &checkpoints[0];
    assert_eq!(plan["type"], "plan");
    assert_eq!(plan["payload"]["name"], "linear");
    assert_eq!(plan["payload"]["inputs"]["steps"][1]["id"], "write");
}

#[test]
fn checkpoint_list_text_is_one_line_each() {
    let temp = Project::empty();
    submit_linear(&temp, "job_lines");

    let run = temp
        .wrkr()
        .args(&["checkpoint", "list", "job_lines"])
        .passes();
    assert_eq!(run.stdout().lines().count(), 4);
    let run = run.stdout_has("plan").stdout_has("completed");
    assert!(run.stdout().lines().all(|l| l.starts_with("cp_")));
}

#[test]
fn written_artifacts_appear_in_the_delta() {
    let temp = Project::empty();
    submit_linear(&temp, "job_delta");

    let checkpoints = temp
        .wrkr()
        .args(&["--json", "checkpoint", "list", "job_delta"])
        .passes()
        .json();
    let write = checkpoints
        .as_array()
        .unwrap()
        .iter()
        .find(|cp| cp["step_id"] == "write")
        .unwrap();
    assert_eq!(
        write["artifacts_delta"]["added"],
        serde_json::json!(["reports/result.md"])
    );
}
