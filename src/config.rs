//! Bridge configuration helpers.
//!
//! The config is optional and project-owned: a missing `.bridge/config.json`
//! means defaults, a malformed one is a configuration error.
use crate::parse::ParseMode;
use crate::project::{config_path, validate_relative_path};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current schema version for `.bridge/config.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_MODELS_DIR: &str = "axioms";
pub const DEFAULT_ACTIONS_DIR: &str = "actions";
pub const DEFAULT_IMAGE: &str = "python:3.11-slim";
pub const DEFAULT_DOMAIN: &str = "core";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub schema_version: u32,
    /// Model source root, relative to the project root.
    pub models_dir: String,
    /// Generated actions root, relative to the project root.
    pub actions_dir: String,
    pub parse_mode: ParseMode,
    /// Base image used when a model declares no `interface.image`.
    pub default_image: String,
    /// Domain bucket used when neither metadata nor the slug table resolves one.
    pub default_domain: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            models_dir: DEFAULT_MODELS_DIR.to_string(),
            actions_dir: DEFAULT_ACTIONS_DIR.to_string(),
            parse_mode: ParseMode::Permissive,
            default_image: DEFAULT_IMAGE.to_string(),
            default_domain: DEFAULT_DOMAIN.to_string(),
        }
    }
}

/// Load `.bridge/config.json`, falling back to defaults when it is absent.
pub fn load_config(project_root: &Path) -> Result<BridgeConfig> {
    let path = config_path(project_root);
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no bridge config; using defaults");
        return Ok(BridgeConfig::default());
    }
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: BridgeConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse bridge config {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(project_root: &Path, config: &BridgeConfig) -> Result<()> {
    let path = config_path(project_root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create bridge dir")?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize bridge config")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Validate schema version and layout fields.
pub fn validate_config(config: &BridgeConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported bridge config schema_version {}",
            config.schema_version
        ));
    }
    validate_relative_path(&config.models_dir, "models_dir")?;
    validate_relative_path(&config.actions_dir, "actions_dir")?;
    if config.models_dir.trim_end_matches('/') == config.actions_dir.trim_end_matches('/') {
        return Err(anyhow!("models_dir and actions_dir must differ"));
    }
    if config.default_image.trim().is_empty() {
        return Err(anyhow!("default_image must be non-empty"));
    }
    if config.default_domain.trim().is_empty() || config.default_domain.contains('/') {
        return Err(anyhow!(
            "default_domain must be a non-empty single path segment (got {:?})",
            config.default_domain
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
