// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cadence policy for `progress` checkpoints

use chrono::{DateTime, Duration, Utc};
use wrkr_core::ProgressCoalescing;

/// Decides which `progress` checkpoints are written.
///
/// Only `progress` is ever skipped; every other type is always appended.
#[derive(Debug, Clone, Copy)]
pub struct CadencePolicy {
    coalescing: ProgressCoalescing,
    min_interval: Duration,
}

impl CadencePolicy {
    pub fn new(coalescing: ProgressCoalescing, min_interval_seconds: u64) -> Self {
        Self {
            coalescing,
            min_interval: Duration::seconds(min_interval_seconds.min(i64::MAX as u64) as i64),
        }
    }

    fn interval_elapsed(&self, now: DateTime<Utc>, last_progress_at: Option<DateTime<Utc>>) -> bool {
        match last_progress_at {
            Some(last) => now - last >= self.min_interval,
            None => true,
        }
    }

    /// Progress for a finished step. `precedes_terminal` is set when the
    /// next checkpoint is the job's `completed` one.
    pub fn allow_step_progress(
        &self,
        now: DateTime<Utc>,
        last_progress_at: Option<DateTime<Utc>>,
        precedes_terminal: bool,
    ) -> bool {
        match self.coalescing {
            ProgressCoalescing::StepBoundary => true,
            ProgressCoalescing::Interval => {
                precedes_terminal || self.interval_elapsed(now, last_progress_at)
            }
        }
    }

    /// Progress inside a step, such as a retried attempt
    pub fn allow_intermediate(
        &self,
        now: DateTime<Utc>,
        last_progress_at: Option<DateTime<Utc>>,
    ) -> bool {
        self.interval_elapsed(now, last_progress_at)
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
