// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::SystemTime;
use wrkr_core::JobSpec;

const HOUR: Duration = Duration::from_secs(3600);

struct Fixture {
    dir: tempfile::TempDir,
    store: JobStore,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path().join("store")).unwrap();
        Self { dir, store }
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn job(&self, job_id: &str) {
        let root = self.store.artifacts_dir(job_id);
        drop(
            self.store
                .create(job_id, Utc::now(), &JobSpec::default(), &root)
                .unwrap(),
        );
    }

    /// Write `<out>/<sub>/<name>` last modified `age` ago
    fn file(&self, sub: &str, name: &str, age: Duration) -> PathBuf {
        let dir = self.out().join(sub);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"0123456789").unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }
}

#[test]
fn nothing_configured_matches_nothing() {
    let f = Fixture::new();
    f.job("job_a");
    f.file("jobpacks", "jobpack_job_a.zip", HOUR);

    let report = prune(&f.store, &f.out(), Utc::now(), &PruneOptions::default()).unwrap();
    assert_eq!(report.checked, 2);
    assert_eq!(report.matched, 0);
    assert!(f.store.exists("job_a"));
}

#[test]
fn dry_run_lists_aged_jobs_without_removing_them() {
    let f = Fixture::new();
    f.job("job_a");
    let options = PruneOptions {
        dry_run: true,
        job_max_age: Some(HOUR),
        ..PruneOptions::default()
    };

    let later = Utc::now() + chrono::Duration::hours(2);
    let report = prune(&f.store, &f.out(), later, &options).unwrap();
    assert!(report.dry_run);
    assert_eq!(report.matched, 1);
    assert_eq!(report.removed, 0);
    assert_eq!(report.freed_bytes, 0);
    assert_eq!(report.entries[0].kind, PruneKind::Job);
    assert_eq!(report.entries[0].path, f.store.job_dir("job_a"));
    assert!(report.entries[0].size_bytes > 0);
    assert!(f.store.exists("job_a"));
}

#[test]
fn aged_jobs_are_removed_unless_running() {
    let f = Fixture::new();
    f.job("job_idle");
    f.job("job_busy");
    let _lease = f.store.acquire("job_busy").unwrap();
    let options = PruneOptions {
        job_max_age: Some(HOUR),
        ..PruneOptions::default()
    };

    let later = Utc::now() + chrono::Duration::hours(2);
    let report = prune(&f.store, &f.out(), later, &options).unwrap();
    assert_eq!(report.matched, 2);
    assert_eq!(report.removed, 1);
    assert!(!f.store.exists("job_idle"));
    assert!(f.store.exists("job_busy"));
    assert_eq!(f.store.list_jobs().unwrap(), vec!["job_busy"]);
    assert!(matches!(
        f.store.snapshot("job_idle"),
        Err(StoreError::JobNotFound(_))
    ));
}

#[test]
fn recent_jobs_are_kept() {
    let f = Fixture::new();
    f.job("job_a");
    let options = PruneOptions {
        job_max_age: Some(HOUR),
        ..PruneOptions::default()
    };
    let report = prune(&f.store, &f.out(), Utc::now(), &options).unwrap();
    assert_eq!(report.matched, 0);
    assert!(f.store.exists("job_a"));
}

#[test]
fn jobpacks_are_capped_by_count_and_age_takes_precedence() {
    let f = Fixture::new();
    let oldest = f.file("jobpacks", "jobpack_a.zip", 3 * HOUR);
    let middle = f.file("jobpacks", "jobpack_b.zip", 2 * HOUR);
    let newest = f.file("jobpacks", "jobpack_c.zip", HOUR / 2);
    let notes = f.file("jobpacks", "notes.txt", 5 * HOUR);
    let options = PruneOptions {
        jobpack_max_age: Some(HOUR * 5 / 2),
        max_jobpacks: Some(1),
        ..PruneOptions::default()
    };

    let report = prune(&f.store, &f.out(), Utc::now(), &options).unwrap();
    assert_eq!(report.checked, 3);
    let matched: Vec<(PathBuf, PruneReason)> = report
        .entries
        .iter()
        .map(|e| (e.path.clone(), e.reason))
        .collect();
    assert_eq!(
        matched,
        vec![
            (oldest.clone(), PruneReason::Age),
            (middle.clone(), PruneReason::Count),
        ]
    );
    assert_eq!(report.removed, 2);
    assert_eq!(report.freed_bytes, 20);
    assert!(!oldest.exists());
    assert!(!middle.exists());
    assert!(newest.exists());
    assert!(notes.exists());
}

#[test]
fn reports_are_pruned_by_age() {
    let f = Fixture::new();
    let old = f.file("reports", "accept.junit.xml", 3 * HOUR);
    let fresh = f.file("reports", "summary.md", HOUR / 4);
    let options = PruneOptions {
        report_max_age: Some(HOUR),
        ..PruneOptions::default()
    };

    let report = prune(&f.store, &f.out(), Utc::now(), &options).unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].kind, PruneKind::Report);
    assert!(!old.exists());
    assert!(fresh.exists());
}

#[test]
fn report_serializes_with_stable_names() {
    let f = Fixture::new();
    f.file("reports", "r.md", 3 * HOUR);
    let options = PruneOptions {
        dry_run: true,
        max_reports: Some(0),
        ..PruneOptions::default()
    };
    let report = prune(&f.store, &f.out(), Utc::now(), &options).unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["entries"][0]["kind"], "report");
    assert_eq!(value["entries"][0]["reason"], "count");
    assert_eq!(value["dry_run"], true);
}
