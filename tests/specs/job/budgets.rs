//! Budget and retry specs
//!
//! Execution failures never fail `submit`; they end the job `failed` with a
//! terminal checkpoint naming the cause.

use crate::prelude::*;

#[test]
fn failing_command_retries_then_fails() {
    let temp = Project::empty();
    temp.file("failing.yaml", FAILING_JOBSPEC);

    let view = temp
        .wrkr()
        .args(&["--json", "submit", "failing.yaml", "--job-id", "job_fail"])
        .passes()
        .json();
    assert_eq!(view["status"], "failed");
    assert_eq!(view["reason_codes"], serde_json::json!(["E_ADAPTER_FAIL"]));
    assert_eq!(view["budget_state"]["retry_count"], 1);
    assert_eq!(view["budget_state"]["tool_call_count"], 2);

    let checkpoints = temp
        .wrkr()
        .args(&["--json", "checkpoint", "list", "job_fail"])
        .passes()
        .json();
    let last = checkpoints.as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["type"], "completed");
    assert_eq!(last["status"], "failed");
}

#[test]
fn step_budget_stops_before_the_offending_step() {
    let temp = Project::empty();
    temp.file("over.yaml", OVER_BUDGET_JOBSPEC);

    let view = temp
        .wrkr()
        .args(&["--json", "submit", "over.yaml", "--job-id", "job_over"])
        .passes()
        .json();
    assert_eq!(view["status"], "failed");
    assert_eq!(view["reason_codes"], serde_json::json!(["E_BUDGET_EXCEEDED"]));
    assert_eq!(view["budget_state"]["step_count"], 2);

    let last_id = view["last_checkpoint_id"].as_str().unwrap();
    let last = temp
        .wrkr()
        .args(&["--json", "checkpoint", "show", "job_over", last_id])
        .passes()
        .json();
    assert_eq!(last["payload"]["violations"], serde_json::json!(["step_count>2"]));
}

#[test]
fn resuming_a_finished_job_is_a_noop() {
    let temp = Project::empty();
    temp.file("linear.yaml", LINEAR_JOBSPEC);
    let first = temp
        .wrkr()
        .args(&["--json", "submit", "linear.yaml", "--job-id", "job_done"])
        .passes()
        .json();

    let again = temp
        .wrkr()
        .args(&["--json", "resume", "job_done"])
        .passes()
        .json();
    assert_eq!(again["status"], "completed");
    assert_eq!(again["checkpoint_count"], first["checkpoint_count"]);
}
