// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_800_000_000 + seconds)
}

#[parameterized(
    first = { None, 0, true },
    too_soon = { Some(0), 5, false },
    exactly = { Some(0), 10, true },
    later = { Some(0), 30, true },
)]
fn intermediate_progress_respects_interval(last: Option<i64>, now: i64, allowed: bool) {
    for coalescing in [ProgressCoalescing::StepBoundary, ProgressCoalescing::Interval] {
        let policy = CadencePolicy::new(coalescing, 10);
        assert_eq!(policy.allow_intermediate(at(now), last.map(at)), allowed);
    }
}

#[test]
fn step_boundary_always_keeps_step_progress() {
    let policy = CadencePolicy::new(ProgressCoalescing::StepBoundary, 3600);
    assert!(policy.allow_step_progress(at(1), Some(at(0)), false));
    assert!(policy.allow_step_progress(at(1), Some(at(0)), true));
}

#[test]
fn interval_coalesces_step_progress() {
    let policy = CadencePolicy::new(ProgressCoalescing::Interval, 10);
    assert!(policy.allow_step_progress(at(0), None, false));
    assert!(!policy.allow_step_progress(at(3), Some(at(0)), false));
    assert!(policy.allow_step_progress(at(12), Some(at(0)), false));
}

#[test]
fn interval_keeps_progress_before_terminal_checkpoint() {
    let policy = CadencePolicy::new(ProgressCoalescing::Interval, 10);
    assert!(policy.allow_step_progress(at(1), Some(at(0)), true));
}

#[test]
fn zero_interval_never_skips() {
    let policy = CadencePolicy::new(ProgressCoalescing::Interval, 0);
    assert!(policy.allow_step_progress(at(0), Some(at(0)), false));
    assert!(policy.allow_intermediate(at(0), Some(at(0))));
}
