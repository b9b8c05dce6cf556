// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact manifest: one entry per written file with its SHA-256, so a
// consumer can tell a regenerated corpus from a stale one.

use std::path::{Path, PathBuf};

use docforge_core::error::Result;
use docforge_core::types::{Artifact, DocumentKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::writer::OutputWriter;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Compute the SHA-256 hash of `data` as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Verify that `data` matches an expected hex-encoded SHA-256 hash.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> bool {
    hash_bytes(data).eq_ignore_ascii_case(expected_hex)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub kind: DocumentKind,
    pub file_name: String,
    pub bytes: u64,
    pub sha256: String,
}

impl ManifestEntry {
    pub fn for_artifact(artifact: &Artifact) -> Self {
        Self {
            id: artifact.document_id.clone(),
            kind: artifact.kind,
            file_name: artifact.file_name(),
            bytes: artifact.bytes.len() as u64,
            sha256: hash_bytes(&artifact.bytes),
        }
    }
}

/// Entries in generation order. No timestamps, so regenerating the same
/// corpus produces the same manifest bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub generator: String,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self {
            generator: format!("docforge {}", env!("CARGO_PKG_VERSION")),
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, artifact: &Artifact) {
        self.entries.push(ManifestEntry::for_artifact(artifact));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut json = serde_json::to_vec_pretty(self)?;
        json.push(b'\n');
        Ok(json)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Ok(serde_json::from_slice(&data)?)
    }

    #[instrument(skip_all, fields(entries = self.entries.len()))]
    pub fn write(&self, writer: &OutputWriter) -> Result<PathBuf> {
        let path = writer.write_bytes(MANIFEST_FILE, &self.to_json()?)?;
        debug!(path = %path.display(), "manifest written");
        Ok(path)
    }

    /// Ids whose file in `dir` is missing or no longer matches its hash.
    pub fn stale_entries(&self, dir: &Path) -> Vec<String> {
        let mut stale = Vec::new();
        for entry in &self.entries {
            match std::fs::read(dir.join(&entry.file_name)) {
                Ok(data) if verify_hash(&data, &entry.sha256) => {}
                Ok(_) => stale.push(entry.id.clone()),
                Err(err) => {
                    warn!(id = %entry.id, error = %err, "manifest entry unreadable");
                    stale.push(entry.id.clone());
                }
            }
        }
        stale
    }
}
