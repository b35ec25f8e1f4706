// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manifest-level comparison of two jobpacks

use super::manifest::{Manifest, MANIFEST_FILE};
use super::verify::{decode, read_entries, SIZE_LIMITS};
use super::JobpackError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Entry paths that differ between two jobpacks, each list sorted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobpackDiff {
    pub job_id_a: String,
    pub job_id_b: String,
    /// Only in `b`
    pub added: Vec<String>,
    /// Only in `a`
    pub removed: Vec<String>,
    /// In both with different checksums
    pub changed: Vec<String>,
}

impl JobpackDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compare the manifests of the jobpacks at `a` and `b`
pub fn diff(a: &Path, b: &Path) -> Result<JobpackDiff, JobpackError> {
    let left = load_manifest(a)?;
    let right = load_manifest(b)?;
    let left_files = files(&left);
    let right_files = files(&right);

    let mut out = JobpackDiff {
        job_id_a: left.job_id.clone(),
        job_id_b: right.job_id.clone(),
        added: Vec::new(),
        removed: Vec::new(),
        changed: Vec::new(),
    };
    for (path, sha) in &left_files {
        match right_files.get(path) {
            None => out.removed.push(path.to_string()),
            Some(other) if other != sha => out.changed.push(path.to_string()),
            Some(_) => {}
        }
    }
    out.added = right_files
        .keys()
        .filter(|path| !left_files.contains_key(*path))
        .map(|path| path.to_string())
        .collect();
    Ok(out)
}

fn load_manifest(path: &Path) -> Result<Manifest, JobpackError> {
    if !path.is_file() {
        return Err(JobpackError::NotFound(path.to_path_buf()));
    }
    let entries = read_entries(path, SIZE_LIMITS)?;
    decode::<Manifest>(&entries, MANIFEST_FILE)?
        .ok_or_else(|| JobpackError::mismatch(MANIFEST_FILE, "missing"))
}

fn files(manifest: &Manifest) -> BTreeMap<&str, &str> {
    manifest
        .files
        .iter()
        .map(|f| (f.path.as_str(), f.sha256.as_str()))
        .collect()
}
