// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acceptance evaluation of a finished job

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use wrkr_adapters::CommandRunner;
use wrkr_core::checkpoint::parse_checkpoint_id;
use wrkr_core::jobspec::check_relative_path;
use wrkr_core::{AcceptConfig, CheckpointType, ErrorCode};
use wrkr_storage::JobState;

pub const ACCEPT_RESULT_SCHEMA_ID: &str = "wrkr.accept_result";
pub const ACCEPT_RESULT_FILE: &str = "accept_result.json";
pub const JUNIT_FILE: &str = "accept.junit.xml";

/// Longest command output kept in a failure message
const MESSAGE_LIMIT: usize = 400;

/// Checks in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptCheck {
    RequiredArtifacts,
    MaxArtifactPaths,
    PathPrefixes,
    SchemaValidity,
    TestCommand,
    LintCommand,
}

impl AcceptCheck {
    pub fn as_str(self) -> &'static str {
        match self {
            AcceptCheck::RequiredArtifacts => "required_artifacts",
            AcceptCheck::MaxArtifactPaths => "max_artifact_paths",
            AcceptCheck::PathPrefixes => "path_prefixes",
            AcceptCheck::SchemaValidity => "schema_validity",
            AcceptCheck::TestCommand => "test_command",
            AcceptCheck::LintCommand => "lint_command",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptFailure {
    pub check: AcceptCheck,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    pub reason_code: ErrorCode,
}

/// One evaluated check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub check: AcceptCheck,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceResult {
    pub schema_id: String,
    pub schema_version: String,
    pub job_id: String,
    pub passed: bool,
    pub checks_run: usize,
    pub checks_passed: usize,
    pub checks: Vec<CheckOutcome>,
    pub failures: Vec<AcceptFailure>,
    pub reason_codes: Vec<ErrorCode>,
}

impl AcceptanceResult {
    fn new(job_id: &str) -> Self {
        Self {
            schema_id: ACCEPT_RESULT_SCHEMA_ID.to_string(),
            schema_version: wrkr_core::SCHEMA_VERSION.to_string(),
            job_id: job_id.to_string(),
            passed: true,
            checks_run: 0,
            checks_passed: 0,
            checks: Vec::new(),
            failures: Vec::new(),
            reason_codes: Vec::new(),
        }
    }

    fn record(&mut self, check: AcceptCheck, failures: Vec<AcceptFailure>) {
        let passed = failures.is_empty();
        self.checks_run += 1;
        if passed {
            self.checks_passed += 1;
        }
        self.checks.push(CheckOutcome { check, passed });
        self.failures.extend(failures);
    }

    fn seal(mut self) -> Self {
        self.passed = self.failures.is_empty();
        let mut codes: Vec<ErrorCode> = self.failures.iter().map(|f| f.reason_code).collect();
        codes.sort();
        codes.dedup();
        self.reason_codes = codes;
        self
    }

    /// Failures of one check
    pub fn failures_for(&self, check: AcceptCheck) -> impl Iterator<Item = &AcceptFailure> {
        self.failures.iter().filter(move |f| f.check == check)
    }

    /// JUnit XML report with one testcase per evaluated check
    pub fn to_junit(&self) -> String {
        let failed = self.checks.iter().filter(|c| !c.passed).count();
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            xml,
            "<testsuite name=\"wrkr-accept\" tests=\"{}\" failures=\"{}\">",
            self.checks.len(),
            failed
        );
        for outcome in &self.checks {
            let name = outcome.check.as_str();
            if outcome.passed {
                let _ = writeln!(xml, "  <testcase classname=\"wrkr.accept\" name=\"{name}\"></testcase>");
                continue;
            }
            let messages: Vec<&str> = self
                .failures_for(outcome.check)
                .map(|f| f.message.as_str())
                .collect();
            let code = self
                .failures_for(outcome.check)
                .next()
                .map(|f| f.reason_code.as_str())
                .unwrap_or_default();
            let _ = writeln!(xml, "  <testcase classname=\"wrkr.accept\" name=\"{name}\">");
            let _ = writeln!(
                xml,
                "    <failure message=\"{}\">{}</failure>",
                escape_xml(&messages.join("; ")),
                code
            );
            let _ = writeln!(xml, "  </testcase>");
        }
        xml.push_str("</testsuite>\n");
        xml
    }
}

/// Evaluate `config` against a job's recorded artifacts.
///
/// Structural checks always run and collect every violation; commands run
/// only when all of them pass.
pub async fn evaluate<R: CommandRunner>(
    runner: &R,
    state: &JobState,
    config: &AcceptConfig,
) -> AcceptanceResult {
    let mut result = AcceptanceResult::new(&state.job_id);
    let artifacts = state.artifacts_added();

    let missing = config
        .required_artifacts
        .iter()
        .filter(|path| {
            check_relative_path(path).is_err() || !state.artifact_root.join(path).is_file()
        })
        .map(|path| AcceptFailure {
            check: AcceptCheck::RequiredArtifacts,
            message: format!("required artifact missing: {path}"),
            artifact: Some(path.clone()),
            reason_code: ErrorCode::AcceptMissingArtifact,
        })
        .collect();
    result.record(AcceptCheck::RequiredArtifacts, missing);

    let max = config.path_rules.max_artifact_paths;
    let mut too_many = Vec::new();
    if max > 0 && artifacts.len() > max {
        too_many.push(AcceptFailure {
            check: AcceptCheck::MaxArtifactPaths,
            message: format!(
                "artifact path count {} exceeds max_artifact_paths={max}",
                artifacts.len()
            ),
            artifact: None,
            reason_code: ErrorCode::AcceptMissingArtifact,
        });
    }
    result.record(AcceptCheck::MaxArtifactPaths, too_many);

    result.record(
        AcceptCheck::PathPrefixes,
        prefix_violations(&artifacts, &config.path_rules),
    );
    result.record(AcceptCheck::SchemaValidity, record_violations(state));

    if !result.failures.is_empty() {
        tracing::info!(job_id = %state.job_id, "structural checks failed; skipping commands");
        return result.seal();
    }

    for (check, command) in [
        (AcceptCheck::TestCommand, config.test_command.trim()),
        (AcceptCheck::LintCommand, config.lint_command.trim()),
    ] {
        if command.is_empty() {
            continue;
        }
        let failure = match runner.run(&state.artifact_root, command).await {
            Ok(output) if output.success() => None,
            Ok(output) => Some(format!(
                "command failed (exit={}): {}",
                output.exit_code,
                bounded(&output.combined())
            )),
            Err(e) => Some(format!("command could not run: {e}")),
        };
        let failures = failure
            .map(|message| AcceptFailure {
                check,
                message,
                artifact: None,
                reason_code: ErrorCode::AcceptTestFail,
            })
            .into_iter()
            .collect();
        result.record(check, failures);
    }

    result.seal()
}

fn prefix_violations(artifacts: &[String], rules: &wrkr_core::PathRules) -> Vec<AcceptFailure> {
    let mut out = Vec::new();
    for artifact in artifacts {
        if let Some(prefix) = rules
            .forbidden_prefixes
            .iter()
            .find(|p| artifact.starts_with(p.as_str()))
        {
            out.push(AcceptFailure {
                check: AcceptCheck::PathPrefixes,
                message: format!("artifact path {artifact:?} matches forbidden prefix {prefix:?}"),
                artifact: Some(artifact.clone()),
                reason_code: ErrorCode::AcceptMissingArtifact,
            });
        }
        if !rules.allowed_prefixes.is_empty()
            && !rules
                .allowed_prefixes
                .iter()
                .any(|p| artifact.starts_with(p.as_str()))
        {
            out.push(AcceptFailure {
                check: AcceptCheck::PathPrefixes,
                message: format!("artifact path {artifact:?} is outside allowed prefixes"),
                artifact: Some(artifact.clone()),
                reason_code: ErrorCode::AcceptMissingArtifact,
            });
        }
    }
    out
}

/// Checkpoints and approvals that do not hold together as a trail
fn record_violations(state: &JobState) -> Vec<AcceptFailure> {
    let mut problems = Vec::new();
    let mut last_seq = 0;
    for (i, cp) in state.checkpoints.iter().enumerate() {
        let index = i + 1;
        match parse_checkpoint_id(&cp.checkpoint_id) {
            Some(seq) if seq > last_seq => last_seq = seq,
            _ => problems.push(format!(
                "checkpoint {index} has out-of-order id {:?}",
                cp.checkpoint_id
            )),
        }
        if cp.job_id != state.job_id {
            problems.push(format!("checkpoint {index} belongs to job {:?}", cp.job_id));
        }
        if cp.kind == CheckpointType::DecisionNeeded && cp.required_action.is_none() {
            problems.push(format!("checkpoint {index} needs a decision but names no action"));
        }
    }
    for (i, approval) in state.approvals.iter().enumerate() {
        let index = i + 1;
        let gate = state
            .checkpoint(&approval.checkpoint_id)
            .filter(|cp| cp.kind == CheckpointType::DecisionNeeded);
        if gate.is_none() {
            problems.push(format!(
                "approval {index} references {:?}, which is not a decision checkpoint",
                approval.checkpoint_id
            ));
        }
        if approval.reason.trim().is_empty() {
            problems.push(format!("approval {index} has no reason"));
        }
    }
    problems
        .into_iter()
        .map(|message| AcceptFailure {
            check: AcceptCheck::SchemaValidity,
            message,
            artifact: None,
            reason_code: ErrorCode::AcceptMissingArtifact,
        })
        .collect()
}

fn bounded(text: &str) -> String {
    match text.char_indices().nth(MESSAGE_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "accept_tests.rs"]
mod tests;
