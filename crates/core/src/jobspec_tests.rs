// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const THREE_STEP: &str = r#"
schema_id: wrkr.jobspec
schema_version: v1
name: " release "
objective: ship it
inputs:
  workspace: "."
  steps:
    - id: build
      summary: Build the thing
      command: "echo built > out.txt"
      artifacts: [out.txt, out.txt]
    - id: review
      summary: Human review
      decision_needed: true
    - id: finalize
      command: "true"
      artifacts: ["reports/result.md"]
expected_artifacts: ["reports/result.md"]
adapter:
  name: reference
budgets:
  max_wall_time_seconds: 600
  max_retries: 2
  max_step_count: 10
  max_tool_calls: 20
checkpoint_policy:
  min_interval_seconds: 5
  required_types: [plan, progress, plan, decision-needed, completed]
environment_fingerprint:
  rules: [os, arch, os]
"#;

fn parse_yaml(content: &str) -> JobSpec {
    JobSpec::parse(content, DocumentFormat::Yaml).unwrap()
}

fn valid() -> JobSpec {
    parse_yaml(THREE_STEP)
}

#[test]
fn validates_and_normalizes_three_step_spec() {
    let spec = valid().validate().unwrap();

    assert_eq!(spec.name, "release");
    assert_eq!(spec.inputs.steps.len(), 3);
    assert_eq!(spec.inputs.steps[0].artifacts, vec!["out.txt"]);
    assert_eq!(spec.inputs.steps[0].executed, Some(true));
    assert_eq!(
        spec.inputs.steps[0].command_to_run(),
        Some("echo built > out.txt")
    );

    let gate = &spec.inputs.steps[1];
    assert!(gate.is_gate());
    assert_eq!(gate.executed, Some(false));
    assert_eq!(gate.required_action.as_deref(), Some("approval"));
    assert_eq!(gate.command_to_run(), None);

    assert_eq!(
        spec.checkpoint_policy.required_types,
        vec!["plan", "progress", "decision-needed", "completed"]
    );
    assert_eq!(spec.environment_fingerprint.rules, vec!["arch", "os"]);
    assert_eq!(
        spec.inputs.extra.get("workspace"),
        Some(&serde_json::json!("."))
    );
}

#[test]
fn validation_is_idempotent() {
    let once = valid().validate().unwrap();
    let twice = once.clone().validate().unwrap();
    assert_eq!(once, twice);
}

#[test]
fn json_documents_parse_the_same_as_yaml() {
    let yaml = valid().validate().unwrap();
    let json_text = serde_json::to_string(&yaml).unwrap();
    let json = JobSpec::parse(&json_text, DocumentFormat::Json)
        .unwrap()
        .validate()
        .unwrap();
    assert_eq!(yaml, json);
}

#[test]
fn empty_adapter_defaults_to_reference() {
    let mut spec = valid();
    spec.adapter.name = "  ".into();
    assert_eq!(spec.validate().unwrap().adapter.name, ADAPTER_REFERENCE);
}

#[test]
fn noop_adapter_allows_zero_steps() {
    let mut spec = valid();
    spec.adapter.name = "noop".into();
    spec.inputs.steps.clear();
    spec.expected_artifacts.clear();
    assert!(spec.validate().unwrap().adapter.is_noop());
}

#[test]
fn executed_false_suppresses_command() {
    let mut spec = valid();
    spec.inputs.steps[0].executed = Some(false);
    let spec = spec.validate().unwrap();
    assert_eq!(spec.inputs.steps[0].command_to_run(), None);
}

fn expect_field(spec: JobSpec, field: &str) {
    let err = spec.validate().unwrap_err();
    assert_eq!(err.field, field, "unexpected error: {err}");
}

#[parameterized(
    schema_id = { "schema_id" },
    schema_version = { "schema_version" },
    name = { "name" },
    adapter = { "adapter.name" },
)]
fn rejects_bad_envelope(field: &str) {
    let mut spec = valid();
    match field {
        "schema_id" => spec.schema_id = "wrkr.other".into(),
        "schema_version" => spec.schema_version = "v2".into(),
        "name" => spec.name = "   ".into(),
        _ => spec.adapter.name = "docker".into(),
    }
    expect_field(spec, field);
}

#[test]
fn rejects_duplicate_step_ids() {
    let mut spec = valid();
    spec.inputs.steps[2].id = "build".into();
    expect_field(spec, "inputs.steps[2].id");
}

#[test]
fn rejects_empty_step_id() {
    let mut spec = valid();
    spec.inputs.steps[0].id = " ".into();
    expect_field(spec, "inputs.steps[0].id");
}

#[test]
fn rejects_gate_with_command() {
    let mut spec = valid();
    spec.inputs.steps[1].command = Some("rm -rf /".into());
    expect_field(spec, "inputs.steps[1].command");
}

#[test]
fn rejects_executed_gate() {
    let mut spec = valid();
    spec.inputs.steps[1].executed = Some(true);
    expect_field(spec, "inputs.steps[1].executed");
}

#[test]
fn rejects_reference_adapter_without_steps() {
    let mut spec = valid();
    spec.inputs.steps.clear();
    spec.expected_artifacts.clear();
    expect_field(spec, "inputs.steps");
}

#[test]
fn rejects_expected_artifact_nobody_produces() {
    let mut spec = valid();
    spec.expected_artifacts.push("reports/missing.md".into());
    expect_field(spec, "expected_artifacts[1]");
}

#[parameterized(
    absolute = { "/etc/passwd" },
    parent = { "../outside.txt" },
    nested_parent = { "reports/../../x" },
    backslash = { "reports\\x" },
    empty = { "  " },
)]
fn rejects_unsafe_artifact_paths(path: &str) {
    let mut spec = valid();
    spec.inputs.steps[0].artifacts = vec![path.to_string()];
    expect_field(spec, "inputs.steps[0].artifacts[0]");
}

#[parameterized(
    wall_time = { "budgets.max_wall_time_seconds" },
    step_count = { "budgets.max_step_count" },
    tool_calls = { "budgets.max_tool_calls" },
)]
fn rejects_zero_budget_ceilings(field: &str) {
    let mut spec = valid();
    match field {
        "budgets.max_wall_time_seconds" => spec.budgets.max_wall_time_seconds = 0,
        "budgets.max_step_count" => spec.budgets.max_step_count = 0,
        _ => spec.budgets.max_tool_calls = 0,
    }
    expect_field(spec, field);
}

#[test]
fn zero_retries_is_allowed() {
    let mut spec = valid();
    spec.budgets.max_retries = 0;
    assert!(spec.validate().is_ok());
}

#[test]
fn negative_budget_is_a_document_error() {
    let content = THREE_STEP.replace("max_retries: 2", "max_retries: -1");
    let err = JobSpec::parse(&content, DocumentFormat::Yaml).unwrap_err();
    assert_eq!(err.field, "document");
}

#[test]
fn rejects_unknown_checkpoint_type() {
    let mut spec = valid();
    spec.checkpoint_policy.required_types.push("heartbeat".into());
    expect_field(spec, "checkpoint_policy.required_types[5]");
}

#[test]
fn rejects_unknown_fingerprint_rule() {
    let mut spec = valid();
    spec.environment_fingerprint.rules.push("gpu".into());
    let err = spec.validate().unwrap_err();
    assert_eq!(err.field, "environment_fingerprint.rules");
    assert!(err.message.contains("gpu"));
}

#[test]
fn missing_budgets_fail_validation() {
    let content = r#"
schema_id: wrkr.jobspec
schema_version: v1
name: x
inputs:
  steps: [{id: a, command: "true"}]
"#;
    expect_field(parse_yaml(content), "budgets.max_wall_time_seconds");
}

#[test]
fn malformed_yaml_is_a_document_error() {
    let err = JobSpec::parse("name: [unclosed", DocumentFormat::Yaml).unwrap_err();
    assert_eq!(err.field, "document");
}

#[test]
fn format_follows_extension() {
    assert_eq!(
        DocumentFormat::from_path(Path::new("job.JSON")),
        DocumentFormat::Json
    );
    assert_eq!(
        DocumentFormat::from_path(Path::new("job.yaml")),
        DocumentFormat::Yaml
    );
    assert_eq!(
        DocumentFormat::from_path(Path::new("jobspec")),
        DocumentFormat::Yaml
    );
}

#[test]
fn default_jobspec_is_valid_and_gated() {
    let spec = default_jobspec(chrono::Utc::now()).validate().unwrap();
    let ids: Vec<_> = spec.inputs.steps.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["plan", "review", "finalize"]);
    assert!(spec.inputs.steps[1].is_gate());
    assert_eq!(spec.budgets.max_tool_calls, 200);
    assert_eq!(spec.checkpoint_policy.min_interval_seconds, 10);
}

#[test]
fn load_reads_file_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("job.yaml");
    std::fs::write(&path, THREE_STEP).unwrap();
    assert_eq!(JobSpec::load(&path).unwrap().inputs.steps.len(), 3);

    let missing = JobSpec::load(&dir.path().join("nope.yaml")).unwrap_err();
    assert_eq!(missing.field, "document");
}
