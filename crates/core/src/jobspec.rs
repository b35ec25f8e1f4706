// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JobSpec document model, validation and normalization
//!
//! A jobspec is parsed from YAML or JSON, then [`JobSpec::validate`] checks it
//! and returns the normalized form the engine stores and executes.

use crate::checkpoint::CheckpointType;
use crate::envfp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path};
use thiserror::Error;

pub const JOBSPEC_SCHEMA_ID: &str = "wrkr.jobspec";

/// Adapter names the engine knows how to drive
pub const ADAPTER_REFERENCE: &str = "reference";
pub const ADAPTER_NOOP: &str = "noop";

/// Default action for gate steps
pub const DEFAULT_REQUIRED_ACTION: &str = "approval";

/// A jobspec or accept config failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `inputs.steps[1].command`
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A declarative plan of steps with budgets and policies
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default)]
    pub schema_id: String,
    #[serde(default)]
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub producer_version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub inputs: Inputs,
    #[serde(default)]
    pub expected_artifacts: Vec<String>,
    #[serde(default)]
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub budgets: Budgets,
    #[serde(default)]
    pub checkpoint_policy: CheckpointPolicy,
    #[serde(default)]
    pub environment_fingerprint: FingerprintRules,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Inputs {
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Free-form inputs carried through to the plan checkpoint
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed: Option<bool>,
    #[serde(default)]
    pub decision_needed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<String>,
}

impl Step {
    /// Gate steps suspend the job until an approval is recorded
    pub fn is_gate(&self) -> bool {
        self.decision_needed
    }

    /// Command to dispatch, if this step runs one
    pub fn command_to_run(&self) -> Option<&str> {
        if self.is_gate() || self.executed == Some(false) {
            return None;
        }
        self.command.as_deref().filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, serde_json::Value>,
}

impl AdapterConfig {
    pub fn is_noop(&self) -> bool {
        self.name == ADAPTER_NOOP
    }
}

/// Immutable resource ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Budgets {
    #[serde(default)]
    pub max_wall_time_seconds: u64,
    #[serde(default)]
    pub max_retries: u64,
    #[serde(default)]
    pub max_step_count: u64,
    #[serde(default)]
    pub max_tool_calls: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckpointPolicy {
    #[serde(default)]
    pub min_interval_seconds: u64,
    #[serde(default)]
    pub required_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FingerprintRules {
    #[serde(default)]
    pub rules: Vec<String>,
}

/// Document encoding, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Deserialize a YAML or JSON document, mapping parse failures to the `document` field
pub fn parse_document<T: serde::de::DeserializeOwned>(
    content: &str,
    format: DocumentFormat,
) -> Result<T, ValidationError> {
    match format {
        DocumentFormat::Json => serde_json::from_str(content)
            .map_err(|e| ValidationError::new("document", format!("invalid JSON: {e}"))),
        DocumentFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| ValidationError::new("document", format!("invalid YAML: {e}"))),
    }
}

impl JobSpec {
    /// Parse without validating
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self, ValidationError> {
        parse_document(content, format)
    }

    /// Read and parse a jobspec file
    pub fn load(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::new("document", format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&content, DocumentFormat::from_path(path))
    }

    /// Validate and normalize, consuming the raw document
    pub fn validate(self) -> Result<JobSpec, ValidationError> {
        let mut spec = self;

        spec.schema_id = spec.schema_id.trim().to_string();
        if spec.schema_id != JOBSPEC_SCHEMA_ID {
            return Err(ValidationError::new(
                "schema_id",
                format!("expected {JOBSPEC_SCHEMA_ID:?}, got {:?}", spec.schema_id),
            ));
        }
        spec.schema_version = spec.schema_version.trim().to_string();
        if spec.schema_version != crate::SCHEMA_VERSION {
            return Err(ValidationError::new(
                "schema_version",
                format!(
                    "expected {:?}, got {:?}",
                    crate::SCHEMA_VERSION,
                    spec.schema_version
                ),
            ));
        }

        spec.name = spec.name.trim().to_string();
        if spec.name.is_empty() {
            return Err(ValidationError::new("name", "must not be empty"));
        }
        spec.objective = spec.objective.trim().to_string();
        spec.producer_version = spec.producer_version.trim().to_string();

        spec.adapter.name = spec.adapter.name.trim().to_string();
        if spec.adapter.name.is_empty() {
            spec.adapter.name = ADAPTER_REFERENCE.to_string();
        }
        if spec.adapter.name != ADAPTER_REFERENCE && spec.adapter.name != ADAPTER_NOOP {
            return Err(ValidationError::new(
                "adapter.name",
                format!("unsupported adapter {:?}", spec.adapter.name),
            ));
        }

        validate_steps(&mut spec.inputs.steps)?;
        if spec.adapter.name == ADAPTER_REFERENCE && spec.inputs.steps.is_empty() {
            return Err(ValidationError::new(
                "inputs.steps",
                "reference adapter requires at least one step",
            ));
        }

        spec.expected_artifacts = normalize_paths(&spec.expected_artifacts, "expected_artifacts")?;
        let produced: HashSet<&str> = spec
            .inputs
            .steps
            .iter()
            .flat_map(|s| s.artifacts.iter().map(String::as_str))
            .collect();
        for (i, artifact) in spec.expected_artifacts.iter().enumerate() {
            if !produced.contains(artifact.as_str()) {
                return Err(ValidationError::new(
                    format!("expected_artifacts[{i}]"),
                    format!("{artifact:?} is not produced by any step"),
                ));
            }
        }

        validate_budgets(&spec.budgets)?;
        spec.checkpoint_policy.required_types =
            normalize_required_types(&spec.checkpoint_policy.required_types)?;

        spec.environment_fingerprint.rules =
            envfp::normalize_rules(&spec.environment_fingerprint.rules).map_err(|rule| {
                ValidationError::new(
                    "environment_fingerprint.rules",
                    format!("unknown rule {rule:?}"),
                )
            })?;

        Ok(spec)
    }
}

fn validate_steps(steps: &mut [Step]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for (i, step) in steps.iter_mut().enumerate() {
        let field = |name: &str| format!("inputs.steps[{i}].{name}");

        step.id = step.id.trim().to_string();
        if step.id.is_empty() {
            return Err(ValidationError::new(field("id"), "must not be empty"));
        }
        if !seen.insert(step.id.clone()) {
            return Err(ValidationError::new(
                field("id"),
                format!("duplicate step id {:?}", step.id),
            ));
        }
        step.summary = step.summary.trim().to_string();
        step.command = step
            .command
            .take()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        step.artifacts = normalize_paths(&step.artifacts, &field("artifacts"))?;

        if step.decision_needed {
            if step.command.is_some() {
                return Err(ValidationError::new(
                    field("command"),
                    "a decision gate step must not declare a command",
                ));
            }
            if step.executed == Some(true) {
                return Err(ValidationError::new(
                    field("executed"),
                    "a decision gate step cannot be executed",
                ));
            }
            step.executed = Some(false);
            let action = step
                .required_action
                .take()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| DEFAULT_REQUIRED_ACTION.to_string());
            step.required_action = Some(action);
        } else {
            step.executed = Some(step.executed.unwrap_or(true));
            step.required_action = step
                .required_action
                .take()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty());
        }
    }
    Ok(())
}

fn validate_budgets(budgets: &Budgets) -> Result<(), ValidationError> {
    let ceilings = [
        ("budgets.max_wall_time_seconds", budgets.max_wall_time_seconds),
        ("budgets.max_step_count", budgets.max_step_count),
        ("budgets.max_tool_calls", budgets.max_tool_calls),
    ];
    for (field, value) in ceilings {
        if value == 0 {
            return Err(ValidationError::new(field, "must be a positive integer"));
        }
    }
    Ok(())
}

fn normalize_required_types(types: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut out: Vec<String> = Vec::new();
    for (i, raw) in types.iter().enumerate() {
        let name = raw.trim();
        if name.parse::<CheckpointType>().is_err() {
            return Err(ValidationError::new(
                format!("checkpoint_policy.required_types[{i}]"),
                format!("unknown checkpoint type {name:?}"),
            ));
        }
        if !out.iter().any(|t| t == name) {
            out.push(name.to_string());
        }
    }
    Ok(out)
}

/// Trim and dedupe a list of artifact paths, rejecting unsafe ones
fn normalize_paths(paths: &[String], field: &str) -> Result<Vec<String>, ValidationError> {
    let mut out: Vec<String> = Vec::new();
    for (i, raw) in paths.iter().enumerate() {
        let path = raw.trim();
        check_relative_path(path)
            .map_err(|message| ValidationError::new(format!("{field}[{i}]"), message))?;
        if !out.iter().any(|p| p == path) {
            out.push(path.to_string());
        }
    }
    Ok(out)
}

/// Artifact paths must stay inside the artifact root
pub fn check_relative_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("path must not be empty".to_string());
    }
    if path.contains('\\') {
        return Err(format!("{path:?} must use forward slashes"));
    }
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(format!("{path:?} escapes the artifact root")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("{path:?} must be relative"))
            }
        }
    }
    Ok(())
}

/// The jobspec written by `wrkr init`
pub fn default_jobspec(created_at: DateTime<Utc>) -> JobSpec {
    let step = |id: &str, summary: &str, command: Option<&str>, artifacts: &[&str]| Step {
        id: id.to_string(),
        summary: summary.to_string(),
        command: command.map(str::to_string),
        artifacts: artifacts.iter().map(|a| a.to_string()).collect(),
        executed: Some(command.is_some()),
        decision_needed: false,
        required_action: None,
    };
    let mut review = step("review", "Review plan before finalizing", None, &[]);
    review.decision_needed = true;
    review.required_action = Some(DEFAULT_REQUIRED_ACTION.to_string());

    JobSpec {
        schema_id: JOBSPEC_SCHEMA_ID.to_string(),
        schema_version: crate::SCHEMA_VERSION.to_string(),
        created_at: Some(created_at),
        producer_version: crate::PRODUCER_VERSION.to_string(),
        name: "wrkr_job".to_string(),
        objective: "Produce a reviewed result report".to_string(),
        inputs: Inputs {
            steps: vec![
                step(
                    "plan",
                    "Write the plan",
                    Some("mkdir -p reports && echo '# Plan' > reports/plan.md"),
                    &["reports/plan.md"],
                ),
                review,
                step(
                    "finalize",
                    "Write the result",
                    Some("mkdir -p reports && echo '# Result' > reports/result.md"),
                    &["reports/result.md"],
                ),
            ],
            extra: BTreeMap::new(),
        },
        expected_artifacts: vec!["reports/result.md".to_string()],
        adapter: AdapterConfig {
            name: ADAPTER_REFERENCE.to_string(),
            config: BTreeMap::new(),
        },
        budgets: Budgets {
            max_wall_time_seconds: 3600,
            max_retries: 2,
            max_step_count: 20,
            max_tool_calls: 200,
        },
        checkpoint_policy: CheckpointPolicy {
            min_interval_seconds: 10,
            required_types: CheckpointType::ALL
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
        },
        environment_fingerprint: FingerprintRules {
            rules: envfp::DEFAULT_RULES.iter().map(|r| r.to_string()).collect(),
        },
    }
}

#[cfg(test)]
#[path = "jobspec_tests.rs"]
mod tests;
