use super::{CheckOutcome, ValidationContext};
use crate::generate::{discover_models, PROVENANCE_LOCK_PREFIX, PROVENANCE_SOURCE_PREFIX};
use crate::manifest::ManifestBackend;
use crate::project::{DESCRIPTOR_FILE, SYNC_FILE};
use crate::sync::load_sync_record;
use crate::util::{file_checksum, list_subdirs};
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::fs;
use std::path::PathBuf;

pub(super) fn coverage<B: ManifestBackend>(ctx: &ValidationContext<'_, B>) -> Result<CheckOutcome> {
    let mut outcome = CheckOutcome::default();
    let models = discover_models(ctx.paths)?;
    for model in &models {
        let rel = ctx.paths.rel_path(model)?;
        if ctx.store.artifact_for(&rel).is_none() {
            outcome.fail(format!("coverage: {rel} has no manifest mapping"));
        }
    }
    outcome.summary = if outcome.passed() {
        format!("all {} models mapped", models.len())
    } else {
        format!("{} of {} models unmapped", outcome.failures, models.len())
    };
    Ok(outcome)
}

pub(super) fn sync_files<B: ManifestBackend>(
    ctx: &ValidationContext<'_, B>,
) -> Result<CheckOutcome> {
    let mut outcome = CheckOutcome::default();
    let dirs = artifact_dirs(ctx)?;
    for dir in &dirs {
        if !dir.join(SYNC_FILE).is_file() {
            let rel = ctx.paths.rel_path(dir)?;
            outcome.fail(format!("sync_files: {rel} has no {SYNC_FILE}"));
        }
    }
    outcome.summary = if outcome.passed() {
        format!("{} bundles carry sync records", dirs.len())
    } else {
        format!("{} of {} bundles missing sync records", outcome.failures, dirs.len())
    };
    Ok(outcome)
}

pub(super) fn checksums<B: ManifestBackend>(
    ctx: &ValidationContext<'_, B>,
) -> Result<CheckOutcome> {
    let mut outcome = CheckOutcome::default();
    let mut verified = 0usize;
    for (source, artifact) in ctx.store.mappings() {
        let source_path = ctx.paths.resolve(source);
        if !source_path.is_file() {
            outcome.fail(format!("checksums: mapped model {source} no longer exists"));
            continue;
        }
        let record = match load_sync_record(&ctx.paths.resolve(artifact)) {
            Ok(Some(record)) => record,
            Ok(None) => {
                outcome
                    .warnings
                    .push(format!("checksums: {artifact} has no sync record; skipped"));
                continue;
            }
            Err(err) => {
                outcome
                    .warnings
                    .push(format!("checksums: {artifact} sync record unreadable ({err:#}); skipped"));
                continue;
            }
        };
        let current = file_checksum(&source_path)?;
        if current == record.checksum {
            verified += 1;
        } else {
            outcome.failures += 1;
            outcome.warnings.push(format!(
                "checksums: drift detected for {source}; {artifact} was generated from different content"
            ));
        }
    }
    outcome.summary = if outcome.passed() {
        format!("{verified} sources match their sync records")
    } else {
        format!("{} sources drifted or missing", outcome.failures)
    };
    Ok(outcome)
}

pub(super) fn manual_edits<B: ManifestBackend>(
    ctx: &ValidationContext<'_, B>,
) -> Result<CheckOutcome> {
    let mut outcome = CheckOutcome::default();
    let artifacts = ctx.store.mappings().values();
    let total = artifacts.len();
    for artifact in artifacts {
        let descriptor = ctx.paths.resolve(artifact).join(DESCRIPTOR_FILE);
        if !descriptor.is_file() {
            outcome.fail(format!(
                "manual_edits: {artifact}/{DESCRIPTOR_FILE} is missing; provenance cannot be attested"
            ));
            continue;
        }
        let text = fs::read_to_string(&descriptor)
            .with_context(|| format!("read {}", descriptor.display()))?;
        if !has_provenance(&text) {
            outcome.fail(format!(
                "manual_edits: {artifact}/{DESCRIPTOR_FILE} lacks its provenance header; possible manual edit"
            ));
        }
    }
    outcome.summary = if outcome.passed() {
        format!("{total} descriptors carry provenance markers")
    } else {
        format!("{} of {total} descriptors may have been edited", outcome.failures)
    };
    Ok(outcome)
}

pub(super) fn manifest_integrity<B: ManifestBackend>(
    ctx: &ValidationContext<'_, B>,
) -> Result<CheckOutcome> {
    let mut outcome = CheckOutcome::default();
    for (source, artifact) in ctx.store.missing_generated() {
        outcome.fail(format!(
            "manifest_integrity: mapping {source} -> {artifact} has no generated record"
        ));
    }
    for (artifact, record) in ctx.store.generated() {
        if ctx.store.artifact_for(&record.source_path) != Some(artifact.as_str()) {
            outcome.warnings.push(format!(
                "manifest_integrity: generated record {artifact} is not mapped from {}",
                record.source_path
            ));
        }
    }
    let total = ctx.store.mappings().len();
    outcome.summary = if outcome.passed() {
        format!("{total} mappings have generated records")
    } else {
        format!("{} of {total} mappings lack generated records", outcome.failures)
    };
    Ok(outcome)
}

pub(super) fn schema_compatibility<B: ManifestBackend>(
    ctx: &ValidationContext<'_, B>,
) -> Result<CheckOutcome> {
    let mut outcome = CheckOutcome::default();
    let dirs = artifact_dirs(ctx)?;
    for dir in &dirs {
        let rel = ctx.paths.rel_path(dir)?;
        let descriptor = dir.join(DESCRIPTOR_FILE);
        if !descriptor.is_file() {
            outcome.fail(format!("schema_compatibility: {rel} has no {DESCRIPTOR_FILE}"));
            continue;
        }
        let text = fs::read_to_string(&descriptor)
            .with_context(|| format!("read {}", descriptor.display()))?;
        if let Err(problem) = descriptor_schema_problem(&text) {
            outcome.fail(format!("schema_compatibility: {rel}/{DESCRIPTOR_FILE} {problem}"));
        }
    }
    outcome.summary = if outcome.passed() {
        format!("{} descriptors are well-formed", dirs.len())
    } else {
        format!("{} of {} descriptors incompatible", outcome.failures, dirs.len())
    };
    Ok(outcome)
}

/// Bundle directories: `<actions>/<domain>/<slug>`.
fn artifact_dirs<B: ManifestBackend>(ctx: &ValidationContext<'_, B>) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for domain in list_subdirs(&ctx.paths.actions_dir())? {
        dirs.extend(list_subdirs(&domain)?);
    }
    Ok(dirs)
}

pub(super) fn has_provenance(text: &str) -> bool {
    let mut source = false;
    let mut lock = false;
    for line in text.lines().map(str::trim_start) {
        source |= line.starts_with(PROVENANCE_SOURCE_PREFIX);
        lock |= line.starts_with(PROVENANCE_LOCK_PREFIX);
    }
    source && lock
}

/// `Ok` when the comment-stripped descriptor has `name` and `runs.using`.
pub(super) fn descriptor_schema_problem(text: &str) -> Result<(), String> {
    let body: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");
    let doc: Value =
        serde_yaml::from_str(&body).map_err(|err| format!("does not parse: {err}"))?;
    if !doc.is_mapping() {
        return Err("is not a mapping".to_string());
    }
    let present = |value: Option<&Value>| value.is_some_and(|value| !value.is_null());
    if !present(doc.get("name")) {
        return Err("has no name".to_string());
    }
    if !present(doc.get("runs").and_then(|runs| runs.get("using"))) {
        return Err("has no runs.using".to_string());
    }
    Ok(())
}
