//! Model → action bundle generation.
//!
//! A generation call renders the whole bundle in memory, stages it, publishes
//! it transactionally, and only then records it in the manifest. Rendering is
//! deterministic: the sync record timestamp is the only value that changes
//! between runs over an unchanged model.
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::manifest::{GeneratedRecord, ManifestBackend, ManifestStore};
use crate::model::Model;
use crate::parse::{parse_model, read_model_text, ParseMode};
use crate::project::{
    ProjectPaths, DESCRIPTOR_FILE, DOCKERFILE_FILE, ENTRYPOINT_FILE, MODEL_EXTENSION, SYNC_FILE,
};
use crate::staging::StagingTxn;
use crate::sync::SyncRecord;
use crate::util::{checksum, collect_files_recursive};
use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use std::path::{Path, PathBuf};

mod descriptor;
mod dockerfile;
mod entrypoint;
mod identity;

pub use descriptor::{PROVENANCE_LOCK_PREFIX, PROVENANCE_SOURCE_PREFIX};
pub use identity::ActionIdentity;

use descriptor::render_descriptor;
use dockerfile::render_dockerfile;
use entrypoint::render_entrypoint;
use identity::resolve_identity;

/// Every file of one generated action, rendered but not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBundle {
    pub descriptor: String,
    pub dockerfile: String,
    pub entrypoint: String,
    pub sync: SyncRecord,
}

/// What a successful generation produced.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub source_path: String,
    pub artifact_path: String,
    pub identity: ActionIdentity,
    pub checksum: String,
    pub files: Vec<PathBuf>,
}

/// Inputs for rendering a bundle.
pub struct RenderArgs<'a> {
    pub model: &'a Model,
    pub identity: &'a ActionIdentity,
    pub source_rel: &'a str,
    pub source_bytes: &'a [u8],
    pub generated_at: &'a str,
    pub default_image: &'a str,
}

/// Render a bundle. Pure apart from serialization errors.
pub fn render_bundle(args: &RenderArgs<'_>) -> Result<ArtifactBundle> {
    Ok(ArtifactBundle {
        descriptor: render_descriptor(args.model, args.identity, args.source_rel)?,
        dockerfile: render_dockerfile(args.model, args.default_image, args.source_rel),
        entrypoint: render_entrypoint(args.model, args.identity, args.source_rel),
        sync: SyncRecord {
            source: args.source_rel.to_string(),
            generated: args.generated_at.to_string(),
            version: args.model.metadata.version.trim().to_string(),
            checksum: checksum(args.source_bytes),
        },
    })
}

/// Every model file under the models root, sorted.
pub fn discover_models(paths: &ProjectPaths) -> Result<Vec<PathBuf>> {
    let files = collect_files_recursive(&paths.models_dir())?;
    Ok(files
        .into_iter()
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext == MODEL_EXTENSION)
        })
        .collect())
}

/// Resolve a user-supplied model path: absolute, cwd-relative, then
/// project-relative.
pub fn resolve_model_path(paths: &ProjectPaths, model_path: &Path) -> Result<PathBuf, BridgeError> {
    let candidate = if model_path.is_absolute() || model_path.exists() {
        model_path.to_path_buf()
    } else {
        paths.root().join(model_path)
    };
    candidate
        .canonicalize()
        .map_err(|_| BridgeError::ModelNotFound(candidate.clone()))
}

/// Generate one model's bundle and record it in the manifest store.
pub fn generate_action<B: ManifestBackend>(
    paths: &ProjectPaths,
    config: &BridgeConfig,
    store: &mut ManifestStore<B>,
    model_path: &Path,
) -> Result<GenerationOutcome> {
    let source_file = resolve_model_path(paths, model_path)?;
    let source_rel = paths
        .rel_path(&source_file)
        .map_err(|_| BridgeError::ModelOutsideRoot(source_file.clone()))?;
    let text = read_model_text(&source_file)?;
    let model = parse_with_mode(&text, config.parse_mode, &source_file)?;
    let identity = resolve_identity(&model, &source_file, &config.default_domain);
    let artifact_rel = paths.artifact_rel(&identity.domain, &identity.slug);
    claim_artifact(paths, store, &source_rel, &artifact_rel)?;

    let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let bundle = render_bundle(&RenderArgs {
        model: &model,
        identity: &identity,
        source_rel: &source_rel,
        source_bytes: text.as_bytes(),
        generated_at: &generated_at,
        default_image: &config.default_image,
    })?;

    let txn = StagingTxn::begin(&paths.txns_root())?;
    txn.write_text(&format!("{artifact_rel}/{DESCRIPTOR_FILE}"), &bundle.descriptor)?;
    txn.write_text(&format!("{artifact_rel}/{DOCKERFILE_FILE}"), &bundle.dockerfile)?;
    txn.write_executable(&format!("{artifact_rel}/{ENTRYPOINT_FILE}"), &bundle.entrypoint)?;
    txn.write_json(&format!("{artifact_rel}/{SYNC_FILE}"), &bundle.sync)?;
    let files = txn
        .publish(paths.root())
        .with_context(|| format!("publish bundle {artifact_rel}"))?;

    store.upsert(
        &source_rel,
        &artifact_rel,
        GeneratedRecord {
            source_path: source_rel.clone(),
            generated_at,
            source_version: bundle.sync.version.clone(),
        },
    );
    store.save()?;
    tracing::info!(source = %source_rel, artifact = %artifact_rel, "generated action");

    Ok(GenerationOutcome {
        source_path: source_rel,
        artifact_path: artifact_rel,
        identity,
        checksum: bundle.sync.checksum,
        files,
    })
}

fn parse_with_mode(text: &str, mode: ParseMode, path: &Path) -> Result<Model, BridgeError> {
    parse_model(text, mode).map_err(|source| BridgeError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Refuse to overwrite a bundle another live model owns. Ownership left
/// behind by a deleted model is released.
fn claim_artifact<B: ManifestBackend>(
    paths: &ProjectPaths,
    store: &mut ManifestStore<B>,
    source_rel: &str,
    artifact_rel: &str,
) -> Result<()> {
    let Some(owner) = store
        .record_for(artifact_rel)
        .map(|record| record.source_path.clone())
        .filter(|owner| owner != source_rel)
    else {
        return Ok(());
    };
    if paths.resolve(&owner).is_file() {
        return Err(anyhow!(
            "{artifact_rel} is already generated from {owner}; models {owner} and {source_rel} resolve to the same action"
        ));
    }
    tracing::warn!(previous = %owner, artifact = artifact_rel, "taking over bundle of a removed model");
    store.remove_source(&owner);
    Ok(())
}

#[cfg(test)]
#[path = "generate/tests.rs"]
mod tests;
