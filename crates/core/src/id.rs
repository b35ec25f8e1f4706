// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job id generation and normalization

use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

/// Longest job id accepted by the store
pub const MAX_JOB_ID_LEN: usize = 128;

#[allow(clippy::expect_used)]
static JOB_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9._-]*[a-z0-9])?$").expect("constant regex pattern is valid")
});

/// Generates unique job identifiers
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self) -> String;
}

/// UUID-based generator producing `job_<uuid-simple>`
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        format!("job_{}", uuid::Uuid::new_v4().simple())
    }
}

/// Sequential ID generator for testing
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("job")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}_{}", self.prefix, n)
    }
}

/// Normalize a caller-supplied job id into the store's id alphabet.
///
/// Lowercases, maps anything outside `[a-z0-9._-]` to `_`, trims leading and
/// trailing separators and falls back to `job` when nothing is left.
pub fn normalize_job_id(raw: &str) -> String {
    let mapped: String = raw
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect();
    let is_separator = |c: char| matches!(c, '_' | '.' | '-');
    let trimmed = mapped.trim_matches(is_separator);
    let bounded: String = trimmed.chars().take(MAX_JOB_ID_LEN).collect();
    let bounded = bounded.trim_end_matches(is_separator);
    if bounded.is_empty() {
        "job".to_string()
    } else {
        bounded.to_string()
    }
}

/// Whether `id` is safe to use as a job directory name
pub fn is_valid_job_id(id: &str) -> bool {
    id.len() <= MAX_JOB_ID_LEN && JOB_ID_PATTERN.is_match(id)
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
