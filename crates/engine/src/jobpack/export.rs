// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic jobpack export

use super::manifest::{Manifest, MANIFEST_FILE};
use super::JobpackError;
use crate::accept::ACCEPT_RESULT_FILE;
use super::verify::{APPROVALS_FILE, CHECKPOINTS_FILE, EVENTS_FILE, JOBSPEC_FILE, JOB_RECORD_FILE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use wrkr_core::canonical::{sha256_hex, to_canonical_string, to_canonical_vec};
use wrkr_storage::{JobState, JobStore};
use zip::write::FileOptions;
use zip::CompressionMethod;

/// Where `export` writes a job's archive under `out_dir`
pub fn jobpack_path(out_dir: &Path, job_id: &str) -> PathBuf {
    out_dir.join("jobpacks").join(format!("jobpack_{job_id}.zip"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportResult {
    pub job_id: String,
    pub path: PathBuf,
    pub manifest_sha256: String,
    pub footer: String,
}

pub(super) const ARTIFACTS_MANIFEST_FILE: &str = "artifacts_manifest.json";

/// One declared artifact in `artifacts_manifest.json`
#[derive(Serialize, Deserialize)]
pub(super) struct ArtifactEntry {
    path: String,
    exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
}

/// Package a job into `<out_dir>/jobpacks/jobpack_<job_id>.zip`.
///
/// Re-exporting an unchanged job yields byte-identical output.
pub fn export(
    store: &JobStore,
    job_id: &str,
    out_dir: &Path,
    producer_version: &str,
) -> Result<ExportResult, JobpackError> {
    let state = store.snapshot(job_id)?;
    let mut entries = collect_entries(store, &state)?;

    let manifest = Manifest::build(job_id, state.updated_at, producer_version, &entries)?;
    entries.insert(MANIFEST_FILE.to_string(), to_canonical_vec(&manifest)?);

    let bytes = write_zip(&entries)?;
    let path = jobpack_path(out_dir, job_id);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("zip.tmp");
    std::fs::write(&tmp, &bytes)?;
    std::fs::rename(&tmp, &path)?;

    tracing::info!(job_id, path = %path.display(), files = manifest.files.len(), "jobpack exported");
    Ok(ExportResult {
        job_id: job_id.to_string(),
        footer: format!(
            "WRKR job_id={job_id} manifest=sha256:{} verify=\"wrkr verify {job_id}\"",
            manifest.manifest_sha256
        ),
        manifest_sha256: manifest.manifest_sha256,
        path,
    })
}

/// Every archive entry except the manifest, keyed by entry name
fn collect_entries(
    store: &JobStore,
    state: &JobState,
) -> Result<BTreeMap<String, Vec<u8>>, JobpackError> {
    let mut entries = BTreeMap::new();
    entries.insert(JOBSPEC_FILE.to_string(), to_canonical_vec(&*state.jobspec)?);

    let record = json!({
        "status": state.status_view(state.updated_at),
        "environment_fingerprint": state.fingerprint,
    });
    entries.insert(JOB_RECORD_FILE.to_string(), to_canonical_vec(&record)?);

    entries.insert(
        CHECKPOINTS_FILE.to_string(),
        jsonl(state.checkpoints.iter().map(|cp| &**cp))?,
    );
    entries.insert(APPROVALS_FILE.to_string(), jsonl(state.approvals.iter())?);

    let mut events = String::new();
    for entry in store.events(&state.job_id)? {
        // Only events already reflected in the snapshot
        if entry.seq > state.last_seq {
            break;
        }
        events.push_str(&entry.to_line()?);
        events.push('\n');
    }
    entries.insert(EVENTS_FILE.to_string(), events.into_bytes());

    let root = state.artifact_root.canonicalize().ok();
    let mut artifacts = Vec::new();
    for path in declared_artifacts(state) {
        let source = state.artifact_root.join(&path);
        if let Some(bytes) = read_contained(root.as_deref(), &source, &state.job_id, &path)? {
            artifacts.push(ArtifactEntry {
                path: path.clone(),
                exists: true,
                sha256: Some(sha256_hex(&bytes)),
            });
            entries.insert(format!("artifacts/{path}"), bytes);
        } else {
            artifacts.push(ArtifactEntry {
                path,
                exists: false,
                sha256: None,
            });
        }
    }
    entries.insert(
        ARTIFACTS_MANIFEST_FILE.to_string(),
        to_canonical_vec(&artifacts)?,
    );

    if let Some(result) = store.read_job_file(&state.job_id, ACCEPT_RESULT_FILE)? {
        entries.insert(format!("accept/{ACCEPT_RESULT_FILE}"), result);
    }
    Ok(entries)
}

/// Read a regular file only if it resolves inside the artifact root
fn read_contained(
    root: Option<&Path>,
    source: &Path,
    job_id: &str,
    path: &str,
) -> Result<Option<Vec<u8>>, JobpackError> {
    let (Some(root), Ok(resolved)) = (root, source.canonicalize()) else {
        return Ok(None);
    };
    if !resolved.starts_with(root) {
        tracing::warn!(job_id, artifact = path, target = %resolved.display(), "artifact links outside the artifact root; skipped");
        return Ok(None);
    }
    if !resolved.is_file() {
        return Ok(None);
    }
    Ok(Some(std::fs::read(&resolved)?))
}

/// Step artifacts and expected artifacts, sorted and deduplicated
fn declared_artifacts(state: &JobState) -> BTreeSet<String> {
    let spec = &state.jobspec;
    spec.inputs
        .steps
        .iter()
        .flat_map(|s| s.artifacts.iter())
        .chain(spec.expected_artifacts.iter())
        .cloned()
        .collect()
}

fn jsonl<'a, T: Serialize + 'a>(
    items: impl Iterator<Item = &'a T>,
) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = String::new();
    for item in items {
        out.push_str(&to_canonical_string(item)?);
        out.push('\n');
    }
    Ok(out.into_bytes())
}

fn write_zip(entries: &BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>, JobpackError> {
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}
