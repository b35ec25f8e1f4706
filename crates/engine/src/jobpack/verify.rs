// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobpack integrity verification

use super::export::{ArtifactEntry, ARTIFACTS_MANIFEST_FILE};
use super::manifest::{Manifest, MANIFEST_FILE};
use super::JobpackError;
use crate::accept::{AcceptanceResult, ACCEPT_RESULT_FILE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use wrkr_adapters::EnvProbe;
use wrkr_core::canonical::sha256_hex;
use wrkr_core::{ApprovalRecord, Checkpoint, EnvFingerprint, JobSpec, JobStatusView};
use wrkr_storage::WalEntry;

/// Archive entries keyed by name
pub(super) type Entries = BTreeMap<String, Vec<u8>>;

/// Bounds on decompressed archive content
#[derive(Debug, Clone, Copy)]
pub(super) struct SizeLimits {
    pub entry: u64,
    pub total: u64,
}

pub(super) const SIZE_LIMITS: SizeLimits = SizeLimits {
    entry: 256 * 1024 * 1024,
    total: 1024 * 1024 * 1024,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub job_id: String,
    pub path: PathBuf,
    pub manifest_sha256: String,
    pub files_checked: usize,
    /// Whether the current host reproduces the recorded fingerprint
    pub reproducible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_env_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_env_hash: Option<String>,
}

/// `job.json`: the status view at export time and the recorded fingerprint
#[derive(Deserialize)]
pub(super) struct JobRecord {
    pub status: JobStatusView,
    #[serde(default)]
    pub environment_fingerprint: Option<EnvFingerprint>,
}

/// Check every manifest entry of the jobpack at `path`.
///
/// Any missing, extra or altered entry is an integrity failure. Record
/// entries must then decode as their typed form. A fingerprint that differs
/// on this host is reported as a warning only.
pub async fn verify<P: EnvProbe>(path: &Path, probe: &P) -> Result<VerifyReport, JobpackError> {
    if !path.is_file() {
        return Err(JobpackError::NotFound(path.to_path_buf()));
    }
    let entries = read_entries(path, SIZE_LIMITS)?;

    let raw = entries
        .get(MANIFEST_FILE)
        .ok_or_else(|| JobpackError::mismatch(MANIFEST_FILE, "missing"))?;
    let manifest: Manifest = serde_json::from_slice(raw)
        .map_err(|e| JobpackError::mismatch(MANIFEST_FILE, format!("unreadable: {e}")))?;
    if manifest.digest()? != manifest.manifest_sha256 {
        return Err(JobpackError::mismatch(MANIFEST_FILE, "manifest digest mismatch"));
    }

    for file in &manifest.files {
        let bytes = entries
            .get(&file.path)
            .ok_or_else(|| JobpackError::mismatch(&file.path, "declared file missing"))?;
        if sha256_hex(bytes) != file.sha256 {
            return Err(JobpackError::mismatch(&file.path, "sha256 mismatch"));
        }
    }
    if let Some(extra) = entries
        .keys()
        .find(|name| name.as_str() != MANIFEST_FILE && manifest.file(name).is_none())
    {
        return Err(JobpackError::mismatch(extra, "undeclared file"));
    }
    check_records(&entries)?;

    let mut report = VerifyReport {
        job_id: manifest.job_id.clone(),
        path: path.to_path_buf(),
        manifest_sha256: manifest.manifest_sha256.clone(),
        files_checked: manifest.files.len(),
        reproducible: true,
        warnings: Vec::new(),
        expected_env_hash: None,
        actual_env_hash: None,
    };

    let recorded = decode::<JobRecord>(&entries, JOB_RECORD_FILE)?
        .and_then(|record| record.environment_fingerprint);
    if let Some(expected) = recorded {
        let actual = wrkr_adapters::capture(probe, &expected.rules).await?;
        if actual.hash != expected.hash {
            report.reproducible = false;
            let drifted: Vec<&str> = expected
                .values
                .iter()
                .filter(|(rule, value)| actual.values.get(*rule) != Some(*value))
                .map(|(rule, _)| rule.as_str())
                .collect();
            report.warnings.push(format!(
                "environment fingerprint differs on this host ({})",
                drifted.join(", ")
            ));
            tracing::warn!(job_id = %report.job_id, expected = %expected.hash, actual = %actual.hash, "environment drift");
        }
        report.expected_env_hash = Some(expected.hash);
        report.actual_env_hash = Some(actual.hash);
    }

    tracing::info!(job_id = %report.job_id, files = report.files_checked, "jobpack verified");
    Ok(report)
}

/// Decode every record entry present in the archive
fn check_records(entries: &Entries) -> Result<(), JobpackError> {
    decode::<JobSpec>(entries, JOBSPEC_FILE)?;
    decode::<JobRecord>(entries, JOB_RECORD_FILE)?;
    decode::<Vec<ArtifactEntry>>(entries, ARTIFACTS_MANIFEST_FILE)?;
    decode::<AcceptanceResult>(entries, &format!("accept/{ACCEPT_RESULT_FILE}"))?;
    decode_lines::<Checkpoint>(entries, CHECKPOINTS_FILE)?;
    decode_lines::<ApprovalRecord>(entries, APPROVALS_FILE)?;
    for (i, entry) in decode_lines::<WalEntry>(entries, EVENTS_FILE)?
        .iter()
        .enumerate()
    {
        if !entry.verify() {
            return Err(JobpackError::schema(EVENTS_FILE, Some(i + 1), "crc mismatch"));
        }
        entry
            .event()
            .map_err(|e| JobpackError::schema(EVENTS_FILE, Some(i + 1), e.to_string()))?;
    }
    Ok(())
}

pub(super) const JOBSPEC_FILE: &str = "jobspec.json";
pub(super) const JOB_RECORD_FILE: &str = "job.json";
pub(super) const CHECKPOINTS_FILE: &str = "checkpoints.jsonl";
pub(super) const APPROVALS_FILE: &str = "approvals.jsonl";
pub(super) const EVENTS_FILE: &str = "events.jsonl";

/// Decode a JSON entry; `None` when the archive does not carry it
pub(super) fn decode<T: DeserializeOwned>(
    entries: &Entries,
    name: &str,
) -> Result<Option<T>, JobpackError> {
    let Some(bytes) = entries.get(name) else {
        return Ok(None);
    };
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| JobpackError::schema(name, None, e.to_string()))
}

/// Decode each non-blank line of a JSONL entry
pub(super) fn decode_lines<T: DeserializeOwned>(
    entries: &Entries,
    name: &str,
) -> Result<Vec<T>, JobpackError> {
    let Some(bytes) = entries.get(name) else {
        return Ok(Vec::new());
    };
    let text = std::str::from_utf8(bytes)
        .map_err(|e| JobpackError::schema(name, None, e.to_string()))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| JobpackError::schema(name, Some(i + 1), e.to_string()))
        })
        .collect()
}

pub(super) fn read_entries(path: &Path, limits: SizeLimits) -> Result<Entries, JobpackError> {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(path)?)?;
    let mut entries = BTreeMap::new();
    let mut total = 0u64;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        if !is_safe_entry(&name) {
            return Err(JobpackError::mismatch(name, "unsafe entry path"));
        }
        let mut content = Vec::new();
        (&mut file)
            .take(limits.entry + 1)
            .read_to_end(&mut content)
            .map_err(|e| JobpackError::mismatch(&name, format!("unreadable: {e}")))?;
        let size = content.len() as u64;
        if size > limits.entry {
            return Err(JobpackError::mismatch(name, "entry exceeds size limit"));
        }
        total += size;
        if total > limits.total {
            return Err(JobpackError::mismatch(name, "archive exceeds size limit"));
        }
        if entries.insert(name.clone(), content).is_some() {
            return Err(JobpackError::mismatch(name, "duplicate entry"));
        }
    }
    Ok(entries)
}

/// Relative, forward-slash paths without traversal
fn is_safe_entry(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && !name.contains('\\')
        && !name.contains(':')
        && name.split('/').all(|part| !part.is_empty() && part != "." && part != "..")
}
