//! Typed paths into a bridge project layout.
//!
//! Centralizing path construction keeps the generator and validator looking
//! at the same files when the layout is reconfigured.
use crate::config::BridgeConfig;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Directory holding manifest, config, reports, and staging areas.
pub const BRIDGE_DIR_REL: &str = ".bridge";
/// Per-bundle file names.
pub const DESCRIPTOR_FILE: &str = "action.yml";
pub const DOCKERFILE_FILE: &str = "Dockerfile";
pub const ENTRYPOINT_FILE: &str = "entrypoint.sh";
pub const SYNC_FILE: &str = ".bridge-sync";
/// Extension identifying model sources.
pub const MODEL_EXTENSION: &str = "fcm";

/// Resolve (and optionally create) the project root.
pub fn ensure_project_root(path: &Path, create: bool) -> Result<PathBuf> {
    if create {
        fs::create_dir_all(path).context("create project root")?;
    }
    path.canonicalize()
        .with_context(|| format!("resolve project root {}", path.display()))
}

/// Convenience wrapper for locating bridge-owned files under a project root.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
    models_rel: String,
    actions_rel: String,
}

impl ProjectPaths {
    /// Create a path helper using the directory layout from `config`.
    pub fn new(root: PathBuf, config: &BridgeConfig) -> Self {
        Self {
            root,
            models_rel: config.models_dir.clone(),
            actions_rel: config.actions_dir.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `.bridge/` directory path.
    pub fn bridge_dir(&self) -> PathBuf {
        bridge_dir(&self.root)
    }

    /// Return the `.bridge/config.json` path.
    pub fn config_path(&self) -> PathBuf {
        config_path(&self.root)
    }

    /// Return the `.bridge/manifest.json` path.
    pub fn manifest_path(&self) -> PathBuf {
        self.bridge_dir().join("manifest.json")
    }

    /// Return the `.bridge/manifest.lock` path.
    pub fn manifest_lock_path(&self) -> PathBuf {
        self.bridge_dir().join("manifest.lock")
    }

    /// Return the `.bridge/validation-report.txt` path.
    pub fn report_text_path(&self) -> PathBuf {
        self.bridge_dir().join("validation-report.txt")
    }

    /// Return the `.bridge/validation-report.json` path.
    pub fn report_json_path(&self) -> PathBuf {
        self.bridge_dir().join("validation-report.json")
    }

    /// Return the `.bridge/txns` directory path.
    pub fn txns_root(&self) -> PathBuf {
        self.bridge_dir().join("txns")
    }

    /// Return the model source root.
    pub fn models_dir(&self) -> PathBuf {
        self.root.join(&self.models_rel)
    }

    /// Return the generated actions root.
    pub fn actions_dir(&self) -> PathBuf {
        self.root.join(&self.actions_rel)
    }

    /// Project-relative artifact directory for an action.
    pub fn artifact_rel(&self, domain: &str, slug: &str) -> String {
        format!("{}/{domain}/{slug}", self.actions_rel.trim_end_matches('/'))
    }

    /// Resolve a project-relative path recorded in the manifest.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Render a path relative to the project root with `/` separators.
    pub fn rel_path(&self, path: &Path) -> Result<String> {
        rel_path(&self.root, path)
    }
}

pub fn bridge_dir(root: &Path) -> PathBuf {
    root.join(BRIDGE_DIR_REL)
}

pub fn config_path(root: &Path) -> PathBuf {
    bridge_dir(root).join("config.json")
}

/// Render `path` relative to `root`, rejecting paths that escape it.
pub fn rel_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| anyhow!("{} is not under {}", path.display(), root.display()))?;
    let parts = rel
        .components()
        .map(|component| match component {
            Component::Normal(part) => Ok(part.to_string_lossy().into_owned()),
            other => Err(anyhow!("unsupported path component {other:?} in {}", path.display())),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("/"))
}

/// Reject absolute paths and `..` so configured directories stay in the root.
pub fn validate_relative_path(rel: &str, label: &str) -> Result<()> {
    let path = Path::new(rel);
    if rel.trim().is_empty() || path.is_absolute() || has_parent_components(path) {
        return Err(anyhow!(
            "{label} must be a relative path without '..' (got {rel:?})"
        ));
    }
    Ok(())
}

fn has_parent_components(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, Component::ParentDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rel_path_uses_forward_slashes_and_rejects_outside_paths() {
        let root = Path::new("/project");
        assert_eq!(
            rel_path(root, Path::new("/project/axioms/git/commit.fcm")).expect("inside"),
            "axioms/git/commit.fcm"
        );
        assert!(rel_path(root, Path::new("/elsewhere/x.fcm")).is_err());
    }

    #[test]
    fn artifact_rel_follows_configured_actions_dir() {
        let config = BridgeConfig {
            actions_dir: "generated/actions/".to_string(),
            ..BridgeConfig::default()
        };
        let paths = ProjectPaths::new(PathBuf::from("/p"), &config);
        assert_eq!(
            paths.artifact_rel("git", "create-commit"),
            "generated/actions/git/create-commit"
        );
        assert_eq!(paths.actions_dir(), PathBuf::from("/p/generated/actions/"));
    }

    #[test]
    fn validate_relative_path_rejects_escapes() {
        assert!(validate_relative_path("axioms", "models_dir").is_ok());
        assert!(validate_relative_path("../axioms", "models_dir").is_err());
        assert!(validate_relative_path("/abs", "models_dir").is_err());
        assert!(validate_relative_path(" ", "models_dir").is_err());
    }
}
