// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::ErrorCode;
use yare::parameterized;

#[parameterized(
    plan = { "plan", CheckpointType::Plan },
    progress = { "progress", CheckpointType::Progress },
    decision = { "decision-needed", CheckpointType::DecisionNeeded },
    blocked = { "blocked", CheckpointType::Blocked },
    completed = { "completed", CheckpointType::Completed },
)]
fn parses_checkpoint_types(text: &str, expected: CheckpointType) {
    assert_eq!(text.parse::<CheckpointType>().unwrap(), expected);
    assert_eq!(expected.to_string(), text);
    assert_eq!(
        serde_json::to_string(&expected).unwrap(),
        format!("\"{text}\"")
    );
}

#[test]
fn rejects_unknown_checkpoint_type() {
    assert!("decision_needed".parse::<CheckpointType>().is_err());
}

#[test]
fn only_progress_is_rate_limited() {
    let limited: Vec<_> = CheckpointType::ALL
        .into_iter()
        .filter(|t| t.is_rate_limited())
        .collect();
    assert_eq!(limited, vec![CheckpointType::Progress]);
}

#[parameterized(
    first = { "cp_1", Some(1) },
    large = { "cp_12345", Some(12345) },
    missing_prefix = { "12", None },
    empty_digits = { "cp_", None },
    signed = { "cp_-1", None },
    traversal = { "cp_1/../2", None },
)]
fn parses_checkpoint_ids(id: &str, expected: Option<u64>) {
    assert_eq!(parse_checkpoint_id(id), expected);
}

#[test]
fn from_draft_assigns_identity() {
    let created_at = chrono::Utc::now();
    let draft = CheckpointDraft::new(
        CheckpointType::Progress,
        JobStatus::Running,
        "step build completed",
        BudgetState::default(),
    )
    .step("build")
    .reason(ErrorCode::AdapterFail)
    .reason(ErrorCode::AdapterFail);

    let cp = Checkpoint::from_draft("job_a", 7, created_at, draft);
    assert_eq!(cp.checkpoint_id, "cp_7");
    assert_eq!(cp.job_id, "job_a");
    assert_eq!(cp.step_id.as_deref(), Some("build"));
    assert_eq!(cp.reason_codes, vec!["E_ADAPTER_FAIL"]);
}

#[test]
fn checkpoint_json_uses_type_key_and_omits_empty_options() {
    let cp = Checkpoint::from_draft(
        "job_a",
        1,
        chrono::Utc::now(),
        CheckpointDraft::new(
            CheckpointType::Plan,
            JobStatus::Pending,
            "plan",
            BudgetState::default(),
        ),
    );
    let value = serde_json::to_value(&cp).unwrap();
    assert_eq!(value["type"], "plan");
    assert!(value.get("step_id").is_none());
    assert!(value.get("required_action").is_none());
    assert!(value.get("payload").is_none());
}
