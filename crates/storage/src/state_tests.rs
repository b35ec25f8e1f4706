// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Duration;
use wrkr_core::{ArtifactsDelta, CheckpointDraft};

struct Replay {
    state: JobState,
    seq: u64,
    now: DateTime<Utc>,
}

impl Replay {
    fn new() -> Self {
        Self {
            state: JobState::new("job_t"),
            seq: 0,
            now: DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000),
        }
    }

    fn push(&mut self, event: JobEvent) {
        self.seq += 1;
        self.now += Duration::seconds(5);
        let entry = WalEntry::new(self.seq, self.now, &event).unwrap();
        self.state.apply(&entry, event);
    }

    fn checkpoint(&mut self, kind: CheckpointType, step: Option<&str>, added: &[&str]) {
        let mut draft =
            CheckpointDraft::new(kind, self.state.status, "test", BudgetState::default())
                .artifacts(ArtifactsDelta {
                    added: added.iter().map(|a| a.to_string()).collect(),
                    missing: Vec::new(),
                });
        if let Some(step) = step {
            draft = draft.step(step);
        }
        self.push(JobEvent::CheckpointEmitted { checkpoint: draft });
    }
}

fn initialized() -> Replay {
    let mut replay = Replay::new();
    let mut jobspec = JobSpec::default();
    jobspec.name = "demo".into();
    replay.push(JobEvent::JobInitialized {
        job_id: "job_t".into(),
        jobspec,
        artifact_root: PathBuf::from("/tmp/artifacts"),
    });
    replay
}

#[test]
fn initialization_sets_identity_and_pending() {
    let replay = initialized();
    let state = &replay.state;
    assert_eq!(state.status, JobStatus::Pending);
    assert_eq!(state.jobspec.name, "demo");
    assert_eq!(state.created_at, replay.now);
    assert_eq!(state.last_seq, 1);
}

#[test]
fn checkpoints_take_ids_from_sequence() {
    let mut replay = initialized();
    replay.checkpoint(CheckpointType::Plan, None, &[]);
    replay.push(JobEvent::StatusChanged {
        from: JobStatus::Pending,
        to: JobStatus::Running,
    });
    replay.checkpoint(CheckpointType::Progress, Some("build"), &["out.txt"]);

    let ids: Vec<_> = replay
        .state
        .checkpoints
        .iter()
        .map(|cp| cp.checkpoint_id.as_str())
        .collect();
    assert_eq!(ids, vec!["cp_2", "cp_4"]);
    assert_eq!(replay.state.checkpoint("cp_4").unwrap().kind, CheckpointType::Progress);
    assert!(replay.state.checkpoint("cp_3").is_none());
    assert!(replay.state.checkpoint("nope").is_none());
    assert_eq!(replay.state.last_progress_at(), Some(replay.now));
}

#[test]
fn decisions_and_approvals_are_tracked() {
    let mut replay = initialized();
    replay.checkpoint(CheckpointType::DecisionNeeded, Some("review"), &[]);
    replay.checkpoint(CheckpointType::DecisionNeeded, Some("signoff"), &[]);

    assert_eq!(
        replay.state.latest_decision().unwrap().step_id.as_deref(),
        Some("signoff")
    );
    assert_eq!(
        replay.state.decision_for_step("review").unwrap().checkpoint_id,
        "cp_2"
    );

    replay.push(JobEvent::ApprovalRecorded {
        checkpoint_id: "cp_2".into(),
        reason: "ok".into(),
        approved_by: "alice".into(),
    });
    let approval = replay.state.approval_for("cp_2").unwrap();
    assert_eq!(approval.job_id, "job_t");
    assert_eq!(approval.approved_by, "alice");
    assert!(replay.state.approval_for("cp_3").is_none());
}

#[test]
fn counters_and_step_index_replay() {
    let mut replay = initialized();
    replay.push(JobEvent::CountersUpdated {
        retry_count: 1,
        step_count: 2,
        tool_call_count: 3,
    });
    replay.push(JobEvent::StepAdvanced { next_step_index: 2 });

    assert_eq!(
        replay.state.counters,
        Counters {
            retry_count: 1,
            step_count: 2,
            tool_call_count: 3
        }
    );
    assert_eq!(replay.state.next_step_index, 2);
}

#[test]
fn artifacts_added_is_sorted_union() {
    let mut replay = initialized();
    replay.checkpoint(CheckpointType::Progress, Some("a"), &["b.txt", "a.txt"]);
    replay.checkpoint(CheckpointType::Progress, Some("b"), &["a.txt", "c.txt"]);
    assert_eq!(replay.state.artifacts_added(), vec!["a.txt", "b.txt", "c.txt"]);
}

#[test]
fn wall_time_stops_at_terminal_event() {
    let mut replay = initialized();
    replay.push(JobEvent::StatusChanged {
        from: JobStatus::Pending,
        to: JobStatus::Running,
    });
    let later = replay.now + Duration::seconds(100);
    assert_eq!(replay.state.wall_time_seconds(later), 105);

    replay.push(JobEvent::StatusChanged {
        from: JobStatus::Running,
        to: JobStatus::Completed,
    });
    assert_eq!(replay.state.wall_time_seconds(later + Duration::hours(1)), 10);
}

#[test]
fn status_view_summarizes_state() {
    let mut replay = initialized();
    replay.checkpoint(CheckpointType::Plan, None, &[]);
    let view = replay.state.status_view(replay.now);
    assert_eq!(view.schema_id, "wrkr.status_response");
    assert_eq!(view.job_id, "job_t");
    assert_eq!(view.name, "demo");
    assert_eq!(view.checkpoint_count, 1);
    assert_eq!(view.last_checkpoint_id.as_deref(), Some("cp_2"));
    assert_eq!(view.environment_hash, None);
}
