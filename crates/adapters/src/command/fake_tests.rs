// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn unscripted_commands_succeed_and_are_recorded() {
    let fake = FakeCommandRunner::new();
    let out = fake.run(Path::new("/work"), "make").await.unwrap();
    assert!(out.success());
    assert_eq!(
        fake.calls(),
        vec![CommandCall {
            cwd: PathBuf::from("/work"),
            command: "make".into()
        }]
    );
}

#[tokio::test]
async fn fail_times_then_succeeds() {
    let fake = FakeCommandRunner::new();
    fake.fail_times("flaky", 2, 7);

    let codes: Vec<i32> = {
        let mut codes = Vec::new();
        for _ in 0..3 {
            codes.push(fake.run(Path::new("/w"), "flaky").await.unwrap().exit_code);
        }
        codes
    };
    assert_eq!(codes, vec![7, 7, 0]);
    assert_eq!(fake.commands(), vec!["flaky", "flaky", "flaky"]);
}

#[tokio::test]
async fn always_fail_never_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeCommandRunner::new();
    fake.always_fail("broken", 1);
    fake.writes_file("broken", "out.txt", "x");
    fake.set_output("broken", "", "boom");

    let out = fake.run(dir.path(), "broken").await.unwrap();
    assert_eq!(out.exit_code, 1);
    assert_eq!(out.stderr, "boom");
    assert!(!dir.path().join("out.txt").exists());
}

#[tokio::test]
async fn successful_runs_write_declared_files() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeCommandRunner::new();
    fake.writes_file("build", "reports/demo.md", "# demo");

    fake.run(dir.path(), "build").await.unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.path().join("reports/demo.md")).unwrap(),
        "# demo"
    );
}
