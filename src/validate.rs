//! Bridge consistency validation.
//!
//! Six checks run over the live model tree, the live actions tree, and the
//! manifest store. Each check is evaluated on its own and contributes one
//! [`CheckResult`] plus any errors and warnings; a failing check never
//! suppresses another. Content problems are findings in the report. Only
//! filesystem failures outside the bridge's control are returned as `Err`.
//!
//! | check | predicate |
//! |-------|-----------|
//! | `coverage` | every discovered model has a manifest mapping |
//! | `sync_files` | every bundle directory holds a sync record |
//! | `checksums` | every mapped model still hashes to its sync record |
//! | `manual_edits` | every mapped descriptor keeps both provenance lines |
//! | `manifest_integrity` | every mapping has a generated record |
//! | `schema_compatibility` | every descriptor parses with `name` and `runs.using` |
use crate::manifest::{ManifestBackend, ManifestStore};
use crate::project::ProjectPaths;
use anyhow::{Context, Result};
use std::fs;

mod checks;
mod report;

pub use report::{CheckResult, ValidationReport};

/// Findings of one check before they are folded into the report.
#[derive(Debug, Default)]
struct CheckOutcome {
    errors: Vec<String>,
    warnings: Vec<String>,
    failures: usize,
    summary: String,
}

impl CheckOutcome {
    fn fail(&mut self, error: String) {
        self.failures += 1;
        self.errors.push(error);
    }

    fn passed(&self) -> bool {
        self.failures == 0
    }
}

struct ValidationContext<'a, B: ManifestBackend> {
    paths: &'a ProjectPaths,
    store: &'a ManifestStore<B>,
}

type CheckFn<B> = fn(&ValidationContext<'_, B>) -> Result<CheckOutcome>;

/// Run every check and assemble the report.
pub fn validate_bridge<B: ManifestBackend>(
    paths: &ProjectPaths,
    store: &ManifestStore<B>,
) -> Result<ValidationReport> {
    let ctx = ValidationContext { paths, store };
    let table: [(&str, CheckFn<B>); 6] = [
        ("coverage", checks::coverage),
        ("sync_files", checks::sync_files),
        ("checksums", checks::checksums),
        ("manual_edits", checks::manual_edits),
        ("manifest_integrity", checks::manifest_integrity),
        ("schema_compatibility", checks::schema_compatibility),
    ];

    let mut report = ValidationReport::default();
    for (name, check) in table {
        let outcome = check(&ctx).with_context(|| format!("run {name} check"))?;
        let passed = outcome.passed();
        tracing::debug!(
            check = name,
            passed,
            errors = outcome.errors.len(),
            warnings = outcome.warnings.len(),
            "validation check finished"
        );
        report.record(
            CheckResult {
                name: name.to_string(),
                passed,
                message: outcome.summary,
            },
            outcome.errors,
            outcome.warnings,
        );
    }
    tracing::info!(
        valid = report.valid,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validation finished"
    );
    Ok(report)
}

/// Persist the text and JSON renderings under `.bridge/`.
pub fn write_report(paths: &ProjectPaths, report: &ValidationReport) -> Result<()> {
    let bridge_dir = paths.bridge_dir();
    fs::create_dir_all(&bridge_dir)
        .with_context(|| format!("create {}", bridge_dir.display()))?;
    let text_path = paths.report_text_path();
    fs::write(&text_path, report.render_text())
        .with_context(|| format!("write {}", text_path.display()))?;
    let json_path = paths.report_json_path();
    let mut json = serde_json::to_string_pretty(report).context("serialize validation report")?;
    json.push('\n');
    fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
    Ok(())
}
