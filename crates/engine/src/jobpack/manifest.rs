// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobpack manifest

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wrkr_core::canonical::{canonical_sha256, sha256_hex};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MANIFEST_SCHEMA_ID: &str = "wrkr.jobpack_manifest";

/// Placeholder hashed in place of the manifest's own digest
const ZERO_DIGEST: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_id: String,
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    pub producer_version: String,
    pub job_id: String,
    pub manifest_sha256: String,
    pub files: Vec<ManifestFile>,
}

impl Manifest {
    /// Index `entries` (sorted by path) and seal the manifest digest
    pub fn build(
        job_id: &str,
        created_at: DateTime<Utc>,
        producer_version: &str,
        entries: &BTreeMap<String, Vec<u8>>,
    ) -> Result<Self, serde_json::Error> {
        let files = entries
            .iter()
            .map(|(path, bytes)| ManifestFile {
                path: path.clone(),
                sha256: sha256_hex(bytes),
            })
            .collect();
        let mut manifest = Self {
            schema_id: MANIFEST_SCHEMA_ID.to_string(),
            schema_version: wrkr_core::SCHEMA_VERSION.to_string(),
            created_at,
            producer_version: producer_version.to_string(),
            job_id: job_id.to_string(),
            manifest_sha256: String::new(),
            files,
        };
        manifest.manifest_sha256 = manifest.digest()?;
        Ok(manifest)
    }

    /// SHA-256 of the canonical manifest with its own digest zeroed
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let mut unsealed = self.clone();
        unsealed.manifest_sha256 = ZERO_DIGEST.to_string();
        canonical_sha256(&unsealed)
    }

    pub fn file(&self, path: &str) -> Option<&ManifestFile> {
        self.files.iter().find(|f| f.path == path)
    }
}
