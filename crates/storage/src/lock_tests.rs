// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn second_acquire_in_process_is_busy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("append.lock");
    let locks = BusyLocks::new();

    let guard = locks.try_acquire("job_a", &path).unwrap();
    assert!(locks.is_held("job_a"));
    assert!(matches!(
        locks.try_acquire("job_a", &path),
        Err(AcquireError::Busy)
    ));

    drop(guard);
    assert!(!locks.is_held("job_a"));
    assert!(locks.try_acquire("job_a", &path).is_ok());
}

#[test]
fn separate_tables_contend_on_the_lock_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("append.lock");
    let first = BusyLocks::new();
    let second = BusyLocks::new();

    let _guard = first.try_acquire("job_a", &path).unwrap();
    assert!(matches!(
        second.try_acquire("job_a", &path),
        Err(AcquireError::Busy)
    ));
    // The failed attempt must not leave a stale table entry
    assert!(!second.is_held("job_a"));
}

#[test]
fn different_jobs_do_not_contend() {
    let dir = tempfile::tempdir().unwrap();
    let locks = BusyLocks::new();
    let _a = locks
        .try_acquire("job_a", &dir.path().join("a.lock"))
        .unwrap();
    let _b = locks
        .try_acquire("job_b", &dir.path().join("b.lock"))
        .unwrap();
}

#[test]
fn missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let locks = BusyLocks::new();
    let result = locks.try_acquire("job_a", &dir.path().join("missing/append.lock"));
    assert!(matches!(result, Err(AcquireError::Io(_))));
    assert!(!locks.is_held("job_a"));
}
