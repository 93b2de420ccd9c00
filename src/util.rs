use anyhow::{Context, Result};
use sha2::Digest;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix used for every checksum recorded by the bridge.
pub const CHECKSUM_PREFIX: &str = "sha256:";

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Checksum in the `sha256:<hex>` form stored in sync records.
pub fn checksum(bytes: &[u8]) -> String {
    format!("{CHECKSUM_PREFIX}{}", sha256_hex(bytes))
}

/// Checksum of a file's current contents.
pub fn file_checksum(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(checksum(&bytes))
}

/// All regular files under `root`, sorted. A missing root yields nothing.
pub fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_files_recursive(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Immediate subdirectories of `dir`, sorted. A missing dir yields nothing.
pub fn list_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
