//! Transactional publishing of generated files.
//!
//! A generation call writes its whole bundle into a staging directory first,
//! then publishes file by file with backups. A failed publish restores every
//! file it touched, so a bundle is either fully replaced or left as it was.
use crate::util::collect_files_recursive;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A staging transaction rooted under `.bridge/txns/`. The directory is
/// removed when the transaction is dropped.
pub struct StagingTxn {
    dir: TempDir,
}

impl StagingTxn {
    pub fn begin(txns_root: &Path) -> Result<Self> {
        fs::create_dir_all(txns_root)
            .with_context(|| format!("create {}", txns_root.display()))?;
        let dir = tempfile::Builder::new()
            .prefix("txn-")
            .tempdir_in(txns_root)
            .with_context(|| format!("create staging txn in {}", txns_root.display()))?;
        Ok(Self { dir })
    }

    pub fn staging_root(&self) -> PathBuf {
        self.dir.path().join("staging")
    }

    pub fn write_text(&self, rel_path: &str, text: &str) -> Result<()> {
        write_staged_bytes(&self.staging_root(), rel_path, text.as_bytes())?;
        Ok(())
    }

    /// Stage a file that must be executable once published.
    pub fn write_executable(&self, rel_path: &str, text: &str) -> Result<()> {
        let path = write_staged_bytes(&self.staging_root(), rel_path, text.as_bytes())?;
        set_executable(&path)?;
        Ok(())
    }

    pub fn write_json<T: serde::Serialize>(&self, rel_path: &str, value: &T) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(value).context("serialize staged JSON")?;
        bytes.push(b'\n');
        write_staged_bytes(&self.staging_root(), rel_path, &bytes)?;
        Ok(())
    }

    /// Publish staged files under `dest_root`, consuming the transaction.
    pub fn publish(self, dest_root: &Path) -> Result<Vec<PathBuf>> {
        let published = publish_staging(&self.staging_root(), dest_root)?;
        tracing::debug!(files = published.len(), "published staged files");
        Ok(published)
    }
}

fn write_staged_bytes(staging_root: &Path, rel_path: &str, bytes: &[u8]) -> Result<PathBuf> {
    let staging_path = staging_root.join(rel_path);
    if let Some(parent) = staging_path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(&staging_path, bytes).with_context(|| format!("write {}", staging_path.display()))?;
    Ok(staging_path)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .with_context(|| format!("inspect {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).with_context(|| format!("chmod {}", path.display()))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn publish_staging(staging_root: &Path, dest_root: &Path) -> Result<Vec<PathBuf>> {
    if !staging_root.exists() {
        return Ok(Vec::new());
    }
    let files = collect_files_recursive(staging_root)?;
    let txn_root = staging_root
        .parent()
        .ok_or_else(|| anyhow!("staging root has no parent"))?;
    let backup_root = txn_root.join("backup");
    fs::create_dir_all(&backup_root)
        .with_context(|| format!("create {}", backup_root.display()))?;
    let mut published = Vec::new();
    let mut backups: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut created: Vec<PathBuf> = Vec::new();
    for file in files {
        let rel = file
            .strip_prefix(staging_root)
            .context("strip staging prefix")?;
        let dest = dest_root.join(rel);
        let step = backup_existing(&dest, &backup_root.join(rel))
            .and_then(|backup| {
                match backup {
                    Some(backup) => backups.push((dest.clone(), backup)),
                    None => created.push(dest.clone()),
                }
                publish_file(&file, &dest)
            });
        if let Err(err) = step {
            tracing::warn!(dest = %dest.display(), "publish failed; rolling back");
            rollback_publish(&published, &backups, &created);
            return Err(err);
        }
        published.push(dest);
    }
    Ok(published)
}

fn backup_existing(dest: &Path, backup: &Path) -> Result<Option<PathBuf>> {
    if !dest.is_file() {
        return Ok(None);
    }
    if let Some(parent) = backup.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::rename(dest, backup)
        .or_else(|_| fs::copy(dest, backup).map(|_| ()))
        .with_context(|| format!("backup {}", dest.display()))?;
    Ok(Some(backup.to_path_buf()))
}

fn publish_file(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file_name = dest
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("staged");
    let tmp_path = dest
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".{file_name}.tmp"));
    fs::copy(source, &tmp_path).with_context(|| format!("publish {}", dest.display()))?;
    fs::rename(&tmp_path, dest).with_context(|| format!("publish {}", dest.display()))?;
    Ok(())
}

fn rollback_publish(published: &[PathBuf], backups: &[(PathBuf, PathBuf)], created: &[PathBuf]) {
    for path in published.iter().chain(created) {
        if path.is_file() {
            let _ = fs::remove_file(path);
        }
    }
    for (dest, backup) in backups {
        if let Some(parent) = dest.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::rename(backup, dest).or_else(|_| fs::copy(backup, dest).map(|_| ()));
    }
}
