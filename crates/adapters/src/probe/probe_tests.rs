// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn rules(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn capture_resolves_every_rule_in_order() {
    let probe = FakeEnvProbe::new();
    probe.set("os", "linux");

    let fp = capture(&probe, &rules(&["arch", "os"])).await.unwrap();
    assert_eq!(probe.calls(), vec!["arch", "os"]);
    assert_eq!(fp.values["os"], "linux");
    assert_eq!(fp.values["arch"], "fake-arch");
    assert!(fp.is_consistent());
}

#[tokio::test]
async fn capture_is_deterministic_for_identical_values() {
    let probe = FakeEnvProbe::new();
    let a = capture(&probe, &rules(&["arch", "os"])).await.unwrap();
    let b = capture(&probe, &rules(&["arch", "os"])).await.unwrap();
    assert_eq!(a.hash, b.hash);

    probe.set("os", "plan9");
    let c = capture(&probe, &rules(&["arch", "os"])).await.unwrap();
    assert_ne!(a.hash, c.hash);
}

#[tokio::test]
async fn capture_rejects_unknown_rule() {
    let probe = FakeEnvProbe::new();
    let err = capture(&probe, &rules(&["gpu"])).await.unwrap_err();
    assert!(matches!(err, ProbeError::UnknownRule(_)));
}

#[tokio::test]
async fn capture_propagates_probe_failure() {
    let probe = FakeEnvProbe::new();
    probe.fail("hostname");
    let err = capture(&probe, &rules(&["hostname"])).await.unwrap_err();
    assert!(matches!(err, ProbeError::Failed { .. }));
}

#[tokio::test]
async fn system_probe_reports_os_and_arch() {
    let probe = SystemEnvProbe::new();
    assert_eq!(probe.resolve(&Rule::Os).await.unwrap(), std::env::consts::OS);
    assert_eq!(
        probe.resolve(&Rule::Arch).await.unwrap(),
        std::env::consts::ARCH
    );
}

#[tokio::test]
async fn system_probe_marks_missing_tool_unavailable() {
    let probe = SystemEnvProbe::new();
    let value = probe
        .resolve(&Rule::Tool("wrkr-definitely-not-installed".into()))
        .await
        .unwrap();
    assert_eq!(value, "unavailable");
}

#[tokio::test]
async fn system_probe_reads_unset_env_as_empty() {
    let probe = SystemEnvProbe::new();
    let value = probe
        .resolve(&Rule::Env("WRKR_TEST_SURELY_UNSET_VAR".into()))
        .await
        .unwrap();
    assert_eq!(value, "");
}
