//! Source ↔ artifact correlation store.
//!
//! The store keeps two indices: `mappings` (source path → artifact path) and
//! `generated` (artifact path → generation record). Both are loaded whole and
//! written whole through a [`ManifestBackend`]; callers that mutate hold the
//! backend's lock for the duration of their read-modify-write.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod backend;
mod lock;

#[cfg(test)]
pub use backend::MemoryBackend;
pub use backend::{JsonFileBackend, ManifestBackend};
pub use lock::ManifestLock;

/// Current schema version for `.bridge/manifest.json`.
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneratedRecord {
    pub source_path: String,
    pub generated_at: String,
    pub source_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ManifestDocument {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
    #[serde(default)]
    pub generated: BTreeMap<String, GeneratedRecord>,
}

fn default_schema_version() -> u32 {
    MANIFEST_SCHEMA_VERSION
}

impl Default for ManifestDocument {
    fn default() -> Self {
        Self {
            schema_version: MANIFEST_SCHEMA_VERSION,
            mappings: BTreeMap::new(),
            generated: BTreeMap::new(),
        }
    }
}

/// Repository over a manifest backend.
pub struct ManifestStore<B: ManifestBackend> {
    backend: B,
    doc: ManifestDocument,
}

impl<B: ManifestBackend> ManifestStore<B> {
    /// Open the store and load its current contents.
    pub fn open(backend: B) -> Result<Self> {
        let doc = backend.load()?;
        Ok(Self { backend, doc })
    }

    /// Reload from the backend, discarding unsaved changes.
    pub fn load(&mut self) -> Result<()> {
        self.doc = self.backend.load()?;
        Ok(())
    }

    /// Record a generation. Remapping a source to a new artifact drops the
    /// record of its previous artifact.
    pub fn upsert(&mut self, source_path: &str, artifact_path: &str, record: GeneratedRecord) {
        let previous = self
            .doc
            .mappings
            .insert(source_path.to_string(), artifact_path.to_string());
        if let Some(previous) = previous.filter(|previous| previous != artifact_path) {
            let owned_by_source = self
                .doc
                .generated
                .get(&previous)
                .is_some_and(|old| old.source_path == source_path);
            if owned_by_source {
                tracing::info!(source = source_path, old = %previous, new = artifact_path, "artifact remapped");
                self.doc.generated.remove(&previous);
            }
        }
        self.doc.generated.insert(artifact_path.to_string(), record);
    }

    /// Forget a source together with the generated record it owns.
    pub fn remove_source(&mut self, source_path: &str) {
        let Some(artifact) = self.doc.mappings.remove(source_path) else {
            return;
        };
        let owned = self
            .doc
            .generated
            .get(&artifact)
            .is_some_and(|record| record.source_path == source_path);
        if owned {
            self.doc.generated.remove(&artifact);
        }
    }

    /// Persist the whole store.
    pub fn save(&self) -> Result<()> {
        self.backend.persist(&self.doc)
    }

    pub fn mappings(&self) -> &BTreeMap<String, String> {
        &self.doc.mappings
    }

    pub fn generated(&self) -> &BTreeMap<String, GeneratedRecord> {
        &self.doc.generated
    }

    pub fn artifact_for(&self, source_path: &str) -> Option<&str> {
        self.doc.mappings.get(source_path).map(String::as_str)
    }

    pub fn record_for(&self, artifact_path: &str) -> Option<&GeneratedRecord> {
        self.doc.generated.get(artifact_path)
    }

    /// Mappings whose artifact has no `generated` record, as (source, artifact).
    pub fn missing_generated(&self) -> Vec<(&str, &str)> {
        self.doc
            .mappings
            .iter()
            .filter(|(_, artifact)| !self.doc.generated.contains_key(*artifact))
            .map(|(source, artifact)| (source.as_str(), artifact.as_str()))
            .collect()
    }

    #[cfg(test)]
    pub fn document(&self) -> &ManifestDocument {
        &self.doc
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
