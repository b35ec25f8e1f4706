// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step executor and job lifecycle operations

use crate::budget::{Admission, BudgetCheck, BudgetEnforcer, BudgetOverrides};
use crate::policy::CadencePolicy;
use crate::EngineError;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wrkr_adapters::{probe, CommandRunner, EnvProbe};
use wrkr_core::checkpoint::RequiredAction;
use wrkr_core::id::normalize_job_id;
use wrkr_core::{
    ApprovalRecord, ArtifactsDelta, Checkpoint, CheckpointDraft, CheckpointType, Clock, ErrorCode,
    IdGen, JobSpec, JobStatus, JobStatusView, ProgressCoalescing, Step, ValidationError,
};
use wrkr_storage::{JobEvent, JobLease, JobState, JobStore, StoreError};

/// Longest command output kept in a checkpoint payload
const OUTPUT_LIMIT: usize = 400;

/// Engine behavior knobs from configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub coalescing: ProgressCoalescing,
    pub producer_version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coalescing: ProgressCoalescing::default(),
            producer_version: wrkr_core::PRODUCER_VERSION.to_string(),
        }
    }
}

/// External collaborators the engine drives
pub struct EngineDeps<R, P> {
    pub runner: R,
    pub probe: P,
}

#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Caller-supplied id, normalized before use
    pub job_id: Option<String>,
    /// Artifact root and step cwd; defaults to `<job_dir>/artifacts`
    pub workdir: Option<PathBuf>,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, Default)]
pub struct ResumeOptions {
    /// Continue despite a changed environment, recording this reason
    pub override_env_mismatch: Option<String>,
    pub approved_by: String,
    pub cancel: CancellationToken,
}

/// Result of a cancel request
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    /// The job is now terminal
    Cancelled(Arc<JobState>),
    /// The job is running elsewhere; it stops at its next admission point
    Requested,
}

/// Drives jobs through their lifecycle against the job store
pub struct Engine<R, P, C: Clock, I: IdGen> {
    store: Arc<JobStore>,
    runner: R,
    probe: P,
    clock: C,
    id_gen: I,
    config: EngineConfig,
}

/// Mutable context for one execution run
struct Run<'a, C: Clock> {
    lease: &'a JobLease,
    spec: Arc<JobSpec>,
    root: PathBuf,
    budget: BudgetEnforcer<C>,
    policy: CadencePolicy,
    cancel: &'a CancellationToken,
}

impl<R, P, C, I> Engine<R, P, C, I>
where
    R: CommandRunner,
    P: EnvProbe,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        store: Arc<JobStore>,
        deps: EngineDeps<R, P>,
        clock: C,
        id_gen: I,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            runner: deps.runner,
            probe: deps.probe,
            clock,
            id_gen,
            config,
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Validate a jobspec, create the job and run it until it finishes or blocks
    pub async fn submit(
        &self,
        spec: JobSpec,
        options: SubmitOptions,
    ) -> Result<Arc<JobState>, EngineError> {
        let now = self.clock.now();
        let mut spec = spec.validate()?;
        if spec.created_at.is_none() {
            spec.created_at = Some(now);
        }
        if spec.producer_version.is_empty() {
            spec.producer_version = self.config.producer_version.clone();
        }

        let job_id = match options.job_id.as_deref() {
            Some(raw) => normalize_job_id(raw),
            None => self.id_gen.next(),
        };
        if self.store.exists(&job_id) {
            return Err(duplicate_job(&job_id));
        }

        let fingerprint = probe::capture(&self.probe, &spec.environment_fingerprint.rules).await?;
        let artifact_root = match &options.workdir {
            Some(dir) => absolute(dir)?,
            None => self.store.artifacts_dir(&job_id),
        };

        let plan = CheckpointDraft::new(
            CheckpointType::Plan,
            JobStatus::Pending,
            format!("plan for {}: {} steps", spec.name, spec.inputs.steps.len()),
            Default::default(),
        )
        .payload(serde_json::to_value(&spec)?);
        let initial = vec![
            JobEvent::EnvFingerprintSet { fingerprint },
            JobEvent::CheckpointEmitted { checkpoint: plan },
        ];

        let lease = match self
            .store
            .create_with(&job_id, now, &spec, &artifact_root, initial)
        {
            Ok(lease) => lease,
            Err(StoreError::JobExists(_)) => return Err(duplicate_job(&job_id)),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(job_id = %job_id, name = %spec.name, steps = spec.inputs.steps.len(), "job submitted");

        self.drive(&lease, &options.cancel).await
    }

    /// Record an approval for a decision-needed checkpoint (the latest one by default)
    pub async fn approve(
        &self,
        job_id: &str,
        checkpoint_id: Option<&str>,
        reason: &str,
        approved_by: &str,
    ) -> Result<ApprovalRecord, EngineError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::new("reason", "must not be empty").into());
        }
        let lease = self.store.acquire(job_id)?;
        let state = lease.state();
        let checkpoint = match checkpoint_id {
            Some(id) => state
                .checkpoint(id)
                .ok_or_else(|| EngineError::CheckpointNotFound {
                    job_id: job_id.to_string(),
                    checkpoint_id: id.to_string(),
                })?,
            None => state
                .latest_decision()
                .ok_or_else(|| EngineError::NothingToApprove {
                    job_id: job_id.to_string(),
                })?,
        };
        if checkpoint.kind != CheckpointType::DecisionNeeded {
            return Err(EngineError::NotApprovable {
                checkpoint_id: checkpoint.checkpoint_id.clone(),
                kind: checkpoint.kind,
            });
        }
        if let Some(existing) = state.approval_for(&checkpoint.checkpoint_id) {
            tracing::debug!(job_id, checkpoint_id = %existing.checkpoint_id, "already approved");
            return Ok(existing.clone());
        }

        let checkpoint_id = checkpoint.checkpoint_id.clone();
        let approved_by = non_empty_or(approved_by, "unknown");
        let state = lease.append(
            self.clock.now(),
            JobEvent::ApprovalRecorded {
                checkpoint_id: checkpoint_id.clone(),
                reason: reason.to_string(),
                approved_by,
            },
        )?;
        tracing::info!(job_id, checkpoint_id = %checkpoint_id, "approval recorded");
        state
            .approval_for(&checkpoint_id)
            .cloned()
            .ok_or(EngineError::NothingToApprove {
                job_id: job_id.to_string(),
            })
    }

    /// Continue a pending, blocked or interrupted job from its persisted position
    pub async fn resume(
        &self,
        job_id: &str,
        options: ResumeOptions,
    ) -> Result<Arc<JobState>, EngineError> {
        let lease = self.store.acquire(job_id)?;
        let state = lease.state();
        if state.status.is_terminal() {
            return Ok(state);
        }

        if state.status == JobStatus::Blocked {
            let approved = state
                .latest_decision()
                .map(|cp| (cp.checkpoint_id.clone(), state.approval_for(&cp.checkpoint_id)));
            if let Some((checkpoint_id, None)) = approved {
                return Err(EngineError::ApprovalRequired {
                    job_id: job_id.to_string(),
                    checkpoint_id,
                });
            }
        }

        self.check_environment(&lease, &state, &options).await?;
        self.drive(&lease, &options.cancel).await
    }

    /// Approve the named gate and resume. A gate that is already approved, or
    /// that the job is no longer blocked on, leaves the job untouched.
    pub async fn resolve(
        &self,
        job_id: &str,
        checkpoint_id: &str,
        reason: &str,
        options: ResumeOptions,
    ) -> Result<Arc<JobState>, EngineError> {
        let state = self.store.snapshot(job_id)?;
        let gate = state
            .checkpoint(checkpoint_id)
            .ok_or_else(|| EngineError::CheckpointNotFound {
                job_id: job_id.to_string(),
                checkpoint_id: checkpoint_id.to_string(),
            })?;
        if gate.kind != CheckpointType::DecisionNeeded {
            return Err(EngineError::NotApprovable {
                checkpoint_id: gate.checkpoint_id.clone(),
                kind: gate.kind,
            });
        }
        let pending = state.status == JobStatus::Blocked
            && state
                .latest_decision()
                .is_some_and(|cp| cp.checkpoint_id == checkpoint_id);
        if !pending || state.approval_for(checkpoint_id).is_some() {
            tracing::debug!(job_id, checkpoint_id, "gate already resolved");
            return Ok(state);
        }
        self.approve(job_id, Some(checkpoint_id), reason, &options.approved_by)
            .await?;
        self.resume(job_id, options).await
    }

    /// Cancel a job: directly when idle, through the marker file when running elsewhere
    pub async fn cancel(&self, job_id: &str, reason: &str) -> Result<CancelOutcome, EngineError> {
        let lease = match self.store.acquire(job_id) {
            Ok(lease) => lease,
            Err(StoreError::JobBusy(_)) => {
                self.store.request_cancel(job_id)?;
                tracing::info!(job_id, "cancel requested for running job");
                return Ok(CancelOutcome::Requested);
            }
            Err(e) => return Err(e.into()),
        };
        let state = lease.state();
        if state.status.is_terminal() {
            return Ok(CancelOutcome::Cancelled(state));
        }
        let budget = BudgetEnforcer::new(
            state.jobspec.budgets,
            state.created_at,
            self.clock.clone(),
            state.counters,
        );
        let reason = non_empty_or(reason, "cancelled by operator");
        let state = self.finish(
            &lease,
            &budget,
            JobStatus::Failed,
            Some(ErrorCode::Cancelled),
            format!("job cancelled: {reason}"),
            json!({ "reason": reason }),
        )?;
        lease.clear_cancel_request()?;
        Ok(CancelOutcome::Cancelled(state))
    }

    /// Check recorded usage against the jobspec budgets with `overrides`
    /// applied. An exceeded budget fails a live job; a finished job is only
    /// reported on.
    pub fn check_budget(
        &self,
        job_id: &str,
        overrides: BudgetOverrides,
    ) -> Result<BudgetCheck, EngineError> {
        let lease = self.store.acquire(job_id)?;
        let state = lease.state();
        let limits = overrides.apply(state.jobspec.budgets);
        let budget = BudgetEnforcer::new(limits, state.created_at, self.clock.clone(), state.counters);
        let mut check = BudgetCheck {
            job_id: job_id.to_string(),
            limits,
            usage: budget.usage(),
            violations: budget.exceeded(),
            checkpoint_id: None,
        };
        if !check.exceeded() || state.status.is_terminal() {
            return Ok(check);
        }

        tracing::warn!(job_id, violations = ?check.violations, "budget exceeded on check");
        let state = self.finish(
            &lease,
            &budget,
            JobStatus::Failed,
            Some(ErrorCode::BudgetExceeded),
            format!("budget exceeded: {}", check.violations.join(", ")),
            json!({
                "violations": check.violations,
                "limits": limits,
                "source": "budget_check",
            }),
        )?;
        check.checkpoint_id = state.last_checkpoint().map(|cp| cp.checkpoint_id.clone());
        Ok(check)
    }

    pub fn status(&self, job_id: &str) -> Result<JobStatusView, EngineError> {
        let state = self.store.snapshot(job_id)?;
        Ok(state.status_view(self.clock.now()))
    }

    /// Every checkpoint of a job, in append order
    pub fn checkpoints(&self, job_id: &str) -> Result<Vec<Arc<Checkpoint>>, EngineError> {
        Ok(self.store.snapshot(job_id)?.checkpoints.clone())
    }

    pub fn checkpoint(&self, job_id: &str, checkpoint_id: &str) -> Result<Arc<Checkpoint>, EngineError> {
        let state = self.store.snapshot(job_id)?;
        state
            .checkpoint(checkpoint_id)
            .cloned()
            .ok_or_else(|| EngineError::CheckpointNotFound {
                job_id: job_id.to_string(),
                checkpoint_id: checkpoint_id.to_string(),
            })
    }

    /// Re-capture the fingerprint and stop on drift unless overridden
    async fn check_environment(
        &self,
        lease: &JobLease,
        state: &JobState,
        options: &ResumeOptions,
    ) -> Result<(), EngineError> {
        let Some(recorded) = state.fingerprint.as_ref() else {
            return Ok(());
        };
        let current = probe::capture(&self.probe, &recorded.rules).await?;
        if current.hash == recorded.hash {
            return Ok(());
        }

        let job_id = lease.job_id();
        if let Some(reason) = options
            .override_env_mismatch
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
        {
            tracing::warn!(job_id, expected = %recorded.hash, actual = %current.hash, "environment override");
            lease.append(
                self.clock.now(),
                JobEvent::EnvOverrideRecorded {
                    expected_hash: recorded.hash.clone(),
                    actual_hash: current.hash,
                    reason: reason.to_string(),
                    approved_by: non_empty_or(&options.approved_by, "unknown"),
                },
            )?;
            return Ok(());
        }

        let budget = BudgetEnforcer::new(
            state.jobspec.budgets,
            state.created_at,
            self.clock.clone(),
            state.counters,
        );
        let draft = CheckpointDraft::new(
            CheckpointType::Blocked,
            state.status,
            "environment fingerprint changed since submit",
            budget.usage(),
        )
        .reason(ErrorCode::EnvFingerprintMismatch)
        .payload(json!({
            "expected": recorded,
            "actual": current,
        }));
        lease.append(self.clock.now(), JobEvent::CheckpointEmitted { checkpoint: draft })?;
        Err(EngineError::EnvMismatch {
            job_id: job_id.to_string(),
            expected: recorded.hash.clone(),
            actual: current.hash,
        })
    }

    /// Execute steps from the persisted position until the job finishes or blocks
    async fn drive(
        &self,
        lease: &JobLease,
        cancel: &CancellationToken,
    ) -> Result<Arc<JobState>, EngineError> {
        let state = lease.state();
        let spec = Arc::clone(&state.jobspec);
        let mut run = Run {
            lease,
            spec: Arc::clone(&spec),
            root: state.artifact_root.clone(),
            budget: BudgetEnforcer::new(
                spec.budgets,
                state.created_at,
                self.clock.clone(),
                state.counters,
            ),
            policy: CadencePolicy::new(
                self.config.coalescing,
                spec.checkpoint_policy.min_interval_seconds,
            ),
            cancel,
        };

        if spec.adapter.is_noop() {
            return self.finish(
                lease,
                &run.budget,
                JobStatus::Completed,
                None,
                "noop adapter: no steps executed".to_string(),
                self.summary_payload(&run),
            );
        }

        self.set_status(lease, JobStatus::Running)?;

        let mut index = state.next_step_index;
        while index < spec.inputs.steps.len() {
            let step = &spec.inputs.steps[index];
            if let Some(state) = self.check_cancel(&run)? {
                return Ok(state);
            }
            if !run.budget.admit_step() {
                return self.fail_budget(&run, Admission::Step, Some(&step.id));
            }

            if step.is_gate() {
                let current = lease.state();
                let approved = current
                    .decision_for_step(&step.id)
                    .and_then(|cp| current.approval_for(&cp.checkpoint_id))
                    .is_some();
                if !approved {
                    return self.block_on_gate(&run, step);
                }
                tracing::info!(step_id = %step.id, "gate approved");
                self.complete_step(
                    &mut run,
                    index,
                    ArtifactsDelta::default(),
                    json!({ "gate": "approved" }),
                )?;
                index += 1;
                continue;
            }

            let outcome = match step.command_to_run() {
                Some(command) => self.run_command(&mut run, step, command).await?,
                None => StepOutcome::Succeeded(json!({ "executed": false })),
            };
            match outcome {
                StepOutcome::Succeeded(payload) => {
                    let delta = artifacts_delta(&run.root, &step.artifacts);
                    self.complete_step(&mut run, index, delta, payload)?;
                }
                StepOutcome::Stopped(state) => return Ok(state),
            }
            index += 1;
        }

        self.finish(
            lease,
            &run.budget,
            JobStatus::Completed,
            None,
            format!("job completed: {} steps executed", run.budget.counters().step_count),
            self.summary_payload(&run),
        )
    }

    /// Dispatch a step command, retrying against the shared retry budget
    async fn run_command(
        &self,
        run: &mut Run<'_, C>,
        step: &Step,
        command: &str,
    ) -> Result<StepOutcome, EngineError> {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            if let Some(state) = self.check_cancel(run)? {
                return Ok(StepOutcome::Stopped(state));
            }
            if !run.budget.admit_tool_call() {
                let state = self.fail_budget(run, Admission::ToolCall, Some(&step.id))?;
                return Ok(StepOutcome::Stopped(state));
            }
            run.budget.record_tool_call();
            self.save_counters(run)?;

            tracing::info!(step_id = %step.id, attempt, "executing");
            let start = std::time::Instant::now();
            let result = self.runner.run(&run.root, command).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            let (succeeded, detail) = match result {
                Ok(output) => (
                    output.success(),
                    json!({
                        "attempt": attempt,
                        "exit_code": output.exit_code,
                        "output": bounded(&output.combined()),
                    }),
                ),
                Err(e) => (
                    false,
                    json!({ "attempt": attempt, "error": e.to_string() }),
                ),
            };

            if succeeded {
                tracing::info!(step_id = %step.id, attempt, elapsed_ms, "completed");
                return Ok(StepOutcome::Succeeded(detail));
            }
            tracing::warn!(step_id = %step.id, attempt, elapsed_ms, "failed");

            if run.budget.record_retry() {
                self.save_counters(run)?;
                let now = self.clock.now();
                if run.policy.allow_intermediate(now, run.lease.state().last_progress_at()) {
                    let draft = CheckpointDraft::new(
                        CheckpointType::Progress,
                        JobStatus::Running,
                        format!("step {} failed on attempt {attempt}; retrying", step.id),
                        run.budget.usage(),
                    )
                    .step(step.id.clone())
                    .reason(ErrorCode::AdapterFail)
                    .payload(detail);
                    run.lease.append(now, JobEvent::CheckpointEmitted { checkpoint: draft })?;
                }
                continue;
            }

            run.budget.record_step();
            self.save_counters(run)?;
            let draft = CheckpointDraft::new(
                CheckpointType::Progress,
                JobStatus::Running,
                format!("step {} failed; retries exhausted", step.id),
                run.budget.usage(),
            )
            .step(step.id.clone())
            .reason(ErrorCode::AdapterFail)
            .payload(detail);
            run.lease
                .append(self.clock.now(), JobEvent::CheckpointEmitted { checkpoint: draft })?;
            let state = self.finish(
                run.lease,
                &run.budget,
                JobStatus::Failed,
                Some(ErrorCode::AdapterFail),
                format!("job failed at step {}", step.id),
                self.summary_payload(run),
            )?;
            return Ok(StepOutcome::Stopped(state));
        }
    }

    /// Count a finished step, write its progress and advance
    fn complete_step(
        &self,
        run: &mut Run<'_, C>,
        index: usize,
        delta: ArtifactsDelta,
        payload: serde_json::Value,
    ) -> Result<(), EngineError> {
        let step_id = run.spec.inputs.steps[index].id.clone();
        run.budget.record_step();
        self.save_counters(run)?;

        let now = self.clock.now();
        let is_last = index + 1 == run.spec.inputs.steps.len();
        if run
            .policy
            .allow_step_progress(now, run.lease.state().last_progress_at(), is_last)
        {
            let summary = match delta.missing.len() {
                0 => format!("step {step_id} completed"),
                n => format!("step {step_id} completed; {n} declared artifacts missing"),
            };
            let draft = CheckpointDraft::new(
                CheckpointType::Progress,
                JobStatus::Running,
                summary,
                run.budget.usage(),
            )
            .step(step_id)
            .artifacts(delta)
            .payload(payload);
            run.lease.append(now, JobEvent::CheckpointEmitted { checkpoint: draft })?;
        }
        run.lease.append(
            self.clock.now(),
            JobEvent::StepAdvanced {
                next_step_index: index + 1,
            },
        )?;
        Ok(())
    }

    fn block_on_gate(&self, run: &Run<'_, C>, step: &Step) -> Result<Arc<JobState>, EngineError> {
        let kind = step
            .required_action
            .clone()
            .unwrap_or_else(|| wrkr_core::jobspec::DEFAULT_REQUIRED_ACTION.to_string());
        let summary = if step.summary.is_empty() {
            format!("decision needed at step {}", step.id)
        } else {
            step.summary.clone()
        };
        let draft = CheckpointDraft::new(
            CheckpointType::DecisionNeeded,
            JobStatus::Blocked,
            summary,
            run.budget.usage(),
        )
        .step(step.id.clone())
        .action(RequiredAction {
            kind,
            instructions: format!("review and approve step {}", step.id),
        })
        .reason(ErrorCode::ApprovalRequired);
        run.lease
            .append(self.clock.now(), JobEvent::CheckpointEmitted { checkpoint: draft })?;
        tracing::info!(job_id = run.lease.job_id(), step_id = %step.id, "blocked on decision");
        self.set_status(run.lease, JobStatus::Blocked)
    }

    /// End the job on cancellation if one was requested
    fn check_cancel(&self, run: &Run<'_, C>) -> Result<Option<Arc<JobState>>, EngineError> {
        if !run.cancel.is_cancelled() && !run.lease.cancel_requested() {
            return Ok(None);
        }
        tracing::info!(job_id = run.lease.job_id(), "cancellation observed");
        let state = self.finish(
            run.lease,
            &run.budget,
            JobStatus::Failed,
            Some(ErrorCode::Cancelled),
            "job cancelled".to_string(),
            json!({ "reason": "cancellation requested" }),
        )?;
        run.lease.clear_cancel_request()?;
        Ok(Some(state))
    }

    fn fail_budget(
        &self,
        run: &Run<'_, C>,
        admission: Admission,
        step_id: Option<&str>,
    ) -> Result<Arc<JobState>, EngineError> {
        let violations = run.budget.violations(admission);
        tracing::warn!(job_id = run.lease.job_id(), ?violations, "budget exceeded");
        let mut payload = self.summary_payload(run);
        payload["violations"] = json!(violations);
        if let Some(step_id) = step_id {
            payload["step_id"] = json!(step_id);
        }
        self.finish(
            run.lease,
            &run.budget,
            JobStatus::Failed,
            Some(ErrorCode::BudgetExceeded),
            format!("budget exceeded: {}", violations.join(", ")),
            payload,
        )
    }

    /// Append the terminal checkpoint, then the status change it describes
    fn finish(
        &self,
        lease: &JobLease,
        budget: &BudgetEnforcer<C>,
        status: JobStatus,
        reason: Option<ErrorCode>,
        summary: String,
        payload: serde_json::Value,
    ) -> Result<Arc<JobState>, EngineError> {
        let mut draft =
            CheckpointDraft::new(CheckpointType::Completed, status, summary, budget.usage())
                .payload(payload);
        if let Some(code) = reason {
            draft = draft.reason(code);
        }
        lease.append(self.clock.now(), JobEvent::CheckpointEmitted { checkpoint: draft })?;
        let state = self.set_status(lease, status)?;
        tracing::info!(job_id = lease.job_id(), status = %status, "job finished");
        Ok(state)
    }

    fn set_status(&self, lease: &JobLease, to: JobStatus) -> Result<Arc<JobState>, EngineError> {
        let from = lease.state().status;
        if from == to {
            return Ok(lease.state());
        }
        if !from.can_transition_to(to) {
            return Err(EngineError::InvalidTransition { from, to });
        }
        Ok(lease.append(self.clock.now(), JobEvent::StatusChanged { from, to })?)
    }

    fn save_counters(&self, run: &Run<'_, C>) -> Result<(), EngineError> {
        let c = run.budget.counters();
        run.lease.append(
            self.clock.now(),
            JobEvent::CountersUpdated {
                retry_count: c.retry_count,
                step_count: c.step_count,
                tool_call_count: c.tool_call_count,
            },
        )?;
        Ok(())
    }

    fn summary_payload(&self, run: &Run<'_, C>) -> serde_json::Value {
        let c = run.budget.counters();
        json!({
            "elapsed_seconds": run.budget.elapsed_seconds(),
            "retries_used": c.retry_count,
            "steps_executed": c.step_count,
        })
    }
}

enum StepOutcome {
    Succeeded(serde_json::Value),
    /// The run ended inside the step
    Stopped(Arc<JobState>),
}

/// Which declared artifacts exist under the artifact root
fn artifacts_delta(root: &Path, declared: &[String]) -> ArtifactsDelta {
    let mut delta = ArtifactsDelta::default();
    for path in declared {
        if root.join(path).is_file() {
            delta.added.push(path.clone());
        } else {
            delta.missing.push(path.clone());
        }
    }
    delta
}

fn bounded(text: &str) -> String {
    match text.char_indices().nth(OUTPUT_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn duplicate_job(job_id: &str) -> EngineError {
    ValidationError::new("job_id", format!("job already exists: {job_id}")).into()
}

fn absolute(dir: &Path) -> Result<PathBuf, EngineError> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
