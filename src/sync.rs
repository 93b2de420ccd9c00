//! Per-bundle sync record (`.bridge-sync`).
//!
//! The record pins a bundle to the exact source bytes it was generated from.
use crate::project::SYNC_FILE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyncRecord {
    /// Project-relative source model path.
    pub source: String,
    /// ISO-8601 UTC generation timestamp.
    pub generated: String,
    /// Model version declared at generation time.
    pub version: String,
    /// `sha256:<hex>` of the source model bytes.
    pub checksum: String,
}

pub fn sync_path(artifact_dir: &Path) -> PathBuf {
    artifact_dir.join(SYNC_FILE)
}

/// Read the sync record of an artifact directory, if one exists.
pub fn load_sync_record(artifact_dir: &Path) -> Result<Option<SyncRecord>> {
    let path = sync_path(artifact_dir);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    let record = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse sync record {}", path.display()))?;
    Ok(Some(record))
}
