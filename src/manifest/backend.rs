//! Persistence backends for the manifest store.
use super::lock::ManifestLock;
use super::{ManifestDocument, MANIFEST_SCHEMA_VERSION};
use anyhow::{anyhow, Context, Result};
#[cfg(test)]
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

/// Where a manifest lives and how writers serialize against each other.
pub trait ManifestBackend {
    /// Load the full document. A backend with nothing stored yields an empty one.
    fn load(&self) -> Result<ManifestDocument>;

    /// Replace the stored document.
    fn persist(&self, doc: &ManifestDocument) -> Result<()>;

    /// Acquire exclusive write access, held until the guard drops.
    fn lock(&self) -> Result<ManifestLock>;
}

/// `.bridge/manifest.json` with an advisory lock file next to it.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: PathBuf, lock_path: PathBuf) -> Self {
        Self { path, lock_path }
    }
}

impl ManifestBackend for JsonFileBackend {
    fn load(&self) -> Result<ManifestDocument> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "manifest missing; starting empty");
            return Ok(ManifestDocument::default());
        }
        let bytes =
            fs::read(&self.path).with_context(|| format!("read manifest {}", self.path.display()))?;
        let doc: ManifestDocument = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse manifest {}", self.path.display()))?;
        if doc.schema_version != MANIFEST_SCHEMA_VERSION {
            return Err(anyhow!(
                "unsupported manifest schema_version {} in {}",
                doc.schema_version,
                self.path.display()
            ));
        }
        Ok(doc)
    }

    /// Write to a sibling temp file and rename it into place so readers never
    /// observe a partial manifest.
    fn persist(&self, doc: &ManifestDocument) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| anyhow!("manifest path has no parent"))?;
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        let mut text = serde_json::to_string_pretty(doc).context("serialize manifest")?;
        text.push('\n');
        let tmp_path = parent.join(".manifest.json.tmp");
        fs::write(&tmp_path, text.as_bytes())
            .with_context(|| format!("write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("write manifest {}", self.path.display()))?;
        tracing::debug!(
            path = %self.path.display(),
            mappings = doc.mappings.len(),
            "manifest saved"
        );
        Ok(())
    }

    fn lock(&self) -> Result<ManifestLock> {
        ManifestLock::acquire(&self.lock_path)
    }
}

/// In-process backend for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    doc: RefCell<Option<ManifestDocument>>,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: ManifestDocument) -> Self {
        Self {
            doc: RefCell::new(Some(doc)),
        }
    }

    /// The last persisted document, if any.
    pub fn persisted(&self) -> Option<ManifestDocument> {
        self.doc.borrow().clone()
    }
}

#[cfg(test)]
impl ManifestBackend for MemoryBackend {
    fn load(&self) -> Result<ManifestDocument> {
        Ok(self.doc.borrow().clone().unwrap_or_default())
    }

    fn persist(&self, doc: &ManifestDocument) -> Result<()> {
        *self.doc.borrow_mut() = Some(doc.clone());
        Ok(())
    }

    fn lock(&self) -> Result<ManifestLock> {
        Ok(ManifestLock::unlocked())
    }
}
