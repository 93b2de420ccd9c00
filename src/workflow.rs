//! Command workflows.
//!
//! Each step loads the project context once, then drives the generator or
//! validator. Per-item ✓/✗ lines and reports go to stdout; diagnostics go
//! through `tracing`.
use crate::cli::{GenerateArgs, InitArgs, InspectArgs, ProjectArgs, ValidateArgs};
use crate::config::{self, BridgeConfig};
use crate::generate::{discover_models, generate_action, GenerationOutcome};
use crate::manifest::{JsonFileBackend, ManifestBackend, ManifestStore};
use crate::parse::{parse_model_file, ParseMode};
use crate::project::{ensure_project_root, ProjectPaths};
use crate::validate::{validate_bridge, write_report};
use anyhow::{anyhow, Context, Result};
use std::fs;

/// Resolved root, config, and paths for one invocation.
pub(crate) struct BridgeContext {
    pub(crate) paths: ProjectPaths,
    pub(crate) config: BridgeConfig,
}

impl BridgeContext {
    pub(crate) fn load(project: &ProjectArgs) -> Result<Self> {
        let root = ensure_project_root(&project.project_root, false)?;
        let config = config::load_config(&root)?;
        let paths = ProjectPaths::new(root, &config);
        Ok(Self { paths, config })
    }

    pub(crate) fn manifest_backend(&self) -> JsonFileBackend {
        JsonFileBackend::new(self.paths.manifest_path(), self.paths.manifest_lock_path())
    }
}

pub fn run_init(args: InitArgs) -> Result<()> {
    let root = ensure_project_root(&args.project.project_root, true)?;
    let config = BridgeConfig::default();
    let paths = ProjectPaths::new(root, &config);
    let config_path = paths.config_path();
    if config_path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            config_path.display()
        ));
    }
    config::write_config(paths.root(), &config)?;
    for dir in [paths.models_dir(), paths.actions_dir()] {
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    }
    println!("wrote {}", config_path.display());
    Ok(())
}

pub fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut ctx = BridgeContext::load(&args.project)?;
    if args.strict {
        ctx.config.parse_mode = ParseMode::Strict;
    }
    let backend = ctx.manifest_backend();
    let _lock = backend.lock()?;
    let mut store = ManifestStore::open(backend)?;

    match args.model {
        Some(model) => {
            let outcome = generate_action(&ctx.paths, &ctx.config, &mut store, &model)?;
            print_outcome(&outcome.source_path, &outcome);
            Ok(())
        }
        None => generate_all(&ctx, &mut store),
    }
}

/// Generate every discovered model; one failure never stops the batch.
fn generate_all<B: ManifestBackend>(
    ctx: &BridgeContext,
    store: &mut ManifestStore<B>,
) -> Result<()> {
    let models = discover_models(&ctx.paths)?;
    if models.is_empty() {
        println!(
            "no models found under {}",
            ctx.paths.models_dir().display()
        );
        return Ok(());
    }

    let mut failed = 0usize;
    for model in &models {
        let label = ctx
            .paths
            .rel_path(model)
            .unwrap_or_else(|_| model.display().to_string());
        match generate_action(&ctx.paths, &ctx.config, store, model) {
            Ok(outcome) => print_outcome(&label, &outcome),
            Err(err) => {
                failed += 1;
                // Drop in-memory changes made before the failure.
                store.load()?;
                tracing::warn!(model = %label, error = %format!("{err:#}"), "generation failed");
                println!("✗ {label}: {err:#}");
            }
        }
    }

    let generated = models.len() - failed;
    println!("generated {generated} of {} models", models.len());
    if failed > 0 {
        return Err(anyhow!("{failed} of {} models failed to generate", models.len()));
    }
    Ok(())
}

fn print_outcome(label: &str, outcome: &GenerationOutcome) {
    tracing::debug!(
        slug = %outcome.identity.slug,
        domain = %outcome.identity.domain,
        checksum = %outcome.checksum,
        files = outcome.files.len(),
        "bundle published"
    );
    println!("✓ {label} -> {}", outcome.artifact_path);
}

/// Run all checks, persist the report, and return overall validity.
pub fn run_validate(args: ValidateArgs) -> Result<bool> {
    let ctx = BridgeContext::load(&args.project)?;
    let store = ManifestStore::open(ctx.manifest_backend())?;
    let report = validate_bridge(&ctx.paths, &store)?;
    write_report(&ctx.paths, &report)?;

    if args.json {
        let text = serde_json::to_string_pretty(&report).context("serialize validation report")?;
        println!("{text}");
    } else {
        print!("{}", report.render_text());
    }
    tracing::debug!(path = %ctx.paths.report_text_path().display(), "wrote validation report");
    Ok(report.valid)
}

pub fn run_inspect(args: InspectArgs) -> Result<()> {
    let mode = if args.strict {
        ParseMode::Strict
    } else {
        ParseMode::Permissive
    };
    let model = parse_model_file(&args.model, mode)?;
    let text = serde_json::to_string_pretty(&model).context("serialize model")?;
    println!("{text}");
    Ok(())
}
