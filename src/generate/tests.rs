use super::identity::{action_slug, humanize, resolve_domain, title_case, DomainSource};
use super::*;
use crate::manifest::{JsonFileBackend, MemoryBackend};
use serde_yaml::Value;
use std::fs;

const COMMIT_MODEL: &str = "\
Model: axiom.git.create_commit
Version: 1.0.0
Layer: axiom
Domain: git
Capability: Create a git commit

Parameters:
  - message: string
  - amend: boolean (optional)
  - action: create|delete|list

Outputs:
  - sha
  - summary: Commit summary line

Interface:
  image: python:3.11-slim
  requirements: [git, unknown-tool]
";

const SCENARIO_MODEL: &str = "\
Model: axiom.core.scenario
Version: 0.1.0
Capability: Scenario action
Parameters:
  - count: number (optional)
  - mode: fast|slow
Outputs:
  - status
";

struct Project {
    _dir: tempfile::TempDir,
    paths: ProjectPaths,
    config: BridgeConfig,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonical root");
        let config = BridgeConfig::default();
        let paths = ProjectPaths::new(root, &config);
        Self {
            _dir: dir,
            paths,
            config,
        }
    }

    fn write_model(&self, rel: &str, text: &str) -> PathBuf {
        let path = self.paths.root().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, text).expect("write model");
        path
    }

    fn store(&self) -> ManifestStore<JsonFileBackend> {
        ManifestStore::open(JsonFileBackend::new(
            self.paths.manifest_path(),
            self.paths.manifest_lock_path(),
        ))
        .expect("open manifest")
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.paths.root().join(rel)).expect("read generated file")
    }
}

fn parse_descriptor(text: &str) -> Value {
    let body: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");
    serde_yaml::from_str(&body).expect("descriptor parses as YAML")
}

fn render(model_text: &str) -> ArtifactBundle {
    let model = parse_model(model_text, ParseMode::Permissive).expect("parse");
    let identity = resolve_identity(&model, Path::new("model.fcm"), "core");
    render_bundle(&RenderArgs {
        model: &model,
        identity: &identity,
        source_rel: "axioms/model.fcm",
        source_bytes: model_text.as_bytes(),
        generated_at: "2026-01-01T00:00:00Z",
        default_image: "python:3.11-slim",
    })
    .expect("render bundle")
}

#[test]
fn slug_title_and_humanized_names() {
    assert_eq!(
        action_slug("axiom.git.create_commit").as_deref(),
        Some("create-commit")
    );
    assert_eq!(action_slug("Single").as_deref(), Some("single"));
    assert_eq!(action_slug("  "), None);
    assert_eq!(title_case("create-commit"), "Create Commit");
    assert_eq!(humanize("commit_message"), "Commit message");
}

#[test]
fn declared_domain_wins_over_classification() {
    assert_eq!(
        resolve_domain("Platform", "create-commit", "core"),
        ("platform".to_string(), DomainSource::Declared)
    );
    assert_eq!(
        resolve_domain("", "create-commit", "core"),
        ("git".to_string(), DomainSource::Classified)
    );
    assert_eq!(
        resolve_domain("", "calculate-version", "core"),
        ("version".to_string(), DomainSource::Classified)
    );
    // Token matching, not substring matching.
    assert_eq!(
        resolve_domain("", "digitize", "core"),
        ("core".to_string(), DomainSource::Default)
    );
}

#[test]
fn identity_falls_back_to_file_stem_without_model_id() {
    let model = parse_model("Capability: x\n", ParseMode::Permissive).expect("parse");
    let identity = resolve_identity(&model, Path::new("axioms/tag_release.fcm"), "core");
    assert_eq!(identity.slug, "tag-release");
    assert_eq!(identity.title, "Tag Release");
    assert_eq!(identity.domain, "release");
}

#[test]
fn descriptor_carries_provenance_header_and_body() {
    let bundle = render(COMMIT_MODEL);
    let mut lines = bundle.descriptor.lines();
    assert_eq!(lines.next(), Some("# Generated from axioms/model.fcm"));
    assert_eq!(lines.next(), Some("# Model: axiom.git.create_commit v1.0.0"));
    assert!(lines
        .next()
        .is_some_and(|line| line.starts_with(PROVENANCE_LOCK_PREFIX)));

    let doc = parse_descriptor(&bundle.descriptor);
    assert_eq!(doc["name"], Value::from("Create Commit"));
    assert_eq!(doc["description"], Value::from("Create a git commit"));
    assert_eq!(doc["runs"]["using"], Value::from("docker"));
    assert_eq!(doc["runs"]["image"], Value::from("Dockerfile"));

    let inputs = doc["inputs"].as_mapping().expect("inputs mapping");
    let names: Vec<_> = inputs.keys().filter_map(Value::as_str).collect();
    assert_eq!(names, vec!["message", "amend", "action"]);
    assert_eq!(doc["inputs"]["message"]["required"], Value::from(true));
    assert!(doc["inputs"]["message"].get("default").is_none());
    assert_eq!(doc["inputs"]["amend"]["required"], Value::from(false));
    assert_eq!(doc["inputs"]["amend"]["default"], Value::from(""));
    let action_desc = doc["inputs"]["action"]["description"]
        .as_str()
        .expect("action description");
    assert!(action_desc.contains("create, delete, list"), "{action_desc}");

    assert_eq!(doc["outputs"]["sha"]["description"], Value::from("Sha"));
    assert_eq!(
        doc["outputs"]["summary"]["description"],
        Value::from("Commit summary line")
    );
}

#[test]
fn scenario_model_generates_expected_inputs_and_outputs() {
    let bundle = render(SCENARIO_MODEL);
    let doc = parse_descriptor(&bundle.descriptor);

    let count = &doc["inputs"]["count"];
    assert_eq!(count["required"], Value::from(false));
    assert_eq!(count["default"], Value::from(""));

    let mode = &doc["inputs"]["mode"];
    assert_eq!(mode["required"], Value::from(true));
    assert!(mode.get("default").is_none());
    assert!(mode["description"]
        .as_str()
        .is_some_and(|desc| desc.contains("fast, slow")));

    assert!(doc["outputs"]["status"].is_mapping());
}

#[test]
fn dockerfile_uses_interface_image_and_recognized_requirements() {
    let bundle = render(COMMIT_MODEL);
    assert!(bundle.dockerfile.contains("FROM python:3.11-slim\n"));
    assert!(bundle
        .dockerfile
        .contains("apt-get install -y --no-install-recommends git "));
    assert!(!bundle.dockerfile.contains("unknown-tool"));
    assert!(bundle
        .dockerfile
        .contains("ENTRYPOINT [\"/entrypoint.sh\"]"));

    let plain = render("Model: a.b.c\nInterface:\n  image: alpine:3.19\n  requirements: jq, git\n");
    assert!(plain.dockerfile.contains("FROM alpine:3.19\n"));
    assert!(plain.dockerfile.contains("RUN apk add --no-cache git jq\n"));

    let bare = render("Model: a.b.c\n");
    assert!(bare.dockerfile.contains("FROM python:3.11-slim\n"));
    assert!(!bare.dockerfile.contains("RUN apt-get"));
}

#[test]
fn entrypoint_defers_to_slug_command() {
    let bundle = render(COMMIT_MODEL);
    assert!(bundle.entrypoint.starts_with("#!/usr/bin/env bash\n"));
    assert!(bundle.entrypoint.contains("echo 'Action: Create Commit'"));
    assert!(bundle.entrypoint.contains("exec create-commit \"$@\""));
    assert!(bundle.entrypoint.contains("DO NOT EDIT"));
}

#[test]
fn sync_record_pins_source_bytes() {
    let bundle = render(SCENARIO_MODEL);
    assert_eq!(bundle.sync.source, "axioms/model.fcm");
    assert_eq!(bundle.sync.version, "0.1.0");
    assert_eq!(bundle.sync.generated, "2026-01-01T00:00:00Z");
    assert_eq!(bundle.sync.checksum, checksum(SCENARIO_MODEL.as_bytes()));
}

#[test]
fn generate_action_writes_bundle_and_updates_manifest() {
    let project = Project::new();
    let model = project.write_model("axioms/git/commit.fcm", COMMIT_MODEL);
    let mut store = project.store();

    let outcome =
        generate_action(&project.paths, &project.config, &mut store, &model).expect("generate");
    assert_eq!(outcome.source_path, "axioms/git/commit.fcm");
    assert_eq!(outcome.artifact_path, "actions/git/create-commit");
    assert_eq!(outcome.files.len(), 4);

    for file in [DESCRIPTOR_FILE, DOCKERFILE_FILE, ENTRYPOINT_FILE, SYNC_FILE] {
        assert!(
            project
                .paths
                .root()
                .join("actions/git/create-commit")
                .join(file)
                .is_file(),
            "missing {file}"
        );
    }
    let sync: SyncRecord =
        serde_json::from_str(&project.read("actions/git/create-commit/.bridge-sync"))
            .expect("sync json");
    assert_eq!(sync.checksum, checksum(COMMIT_MODEL.as_bytes()));
    assert!(sync.generated.ends_with('Z'));

    let reopened = project.store();
    assert_eq!(
        reopened.artifact_for("axioms/git/commit.fcm"),
        Some("actions/git/create-commit")
    );
    let record = reopened
        .record_for("actions/git/create-commit")
        .expect("generated record");
    assert_eq!(record.source_path, "axioms/git/commit.fcm");
    assert_eq!(record.source_version, "1.0.0");
    assert!(fs::read_dir(project.paths.txns_root())
        .expect("txns dir")
        .next()
        .is_none());
}

#[test]
fn regeneration_is_byte_identical_except_timestamp() {
    let project = Project::new();
    let model = project.write_model("axioms/commit.fcm", COMMIT_MODEL);
    let mut store = project.store();
    let bundle_dir = "actions/git/create-commit";

    generate_action(&project.paths, &project.config, &mut store, &model).expect("first");
    let first: Vec<String> = [DESCRIPTOR_FILE, DOCKERFILE_FILE, ENTRYPOINT_FILE]
        .iter()
        .map(|file| project.read(&format!("{bundle_dir}/{file}")))
        .collect();
    let first_sync: SyncRecord =
        serde_json::from_str(&project.read(&format!("{bundle_dir}/{SYNC_FILE}"))).expect("sync");

    generate_action(&project.paths, &project.config, &mut store, &model).expect("second");
    let second: Vec<String> = [DESCRIPTOR_FILE, DOCKERFILE_FILE, ENTRYPOINT_FILE]
        .iter()
        .map(|file| project.read(&format!("{bundle_dir}/{file}")))
        .collect();
    let second_sync: SyncRecord =
        serde_json::from_str(&project.read(&format!("{bundle_dir}/{SYNC_FILE}"))).expect("sync");

    assert_eq!(first, second);
    assert_eq!(first_sync.checksum, second_sync.checksum);
    assert_eq!(first_sync.source, second_sync.source);
    assert_eq!(first_sync.version, second_sync.version);
}

#[test]
fn missing_model_is_not_found() {
    let project = Project::new();
    let mut store = ManifestStore::open(MemoryBackend::new()).expect("open");
    let err = generate_action(
        &project.paths,
        &project.config,
        &mut store,
        Path::new("axioms/missing.fcm"),
    )
    .expect_err("missing model");
    assert!(matches!(
        err.downcast_ref::<BridgeError>(),
        Some(BridgeError::ModelNotFound(_))
    ));
    assert!(store.mappings().is_empty());
}

#[test]
fn strict_mode_failure_writes_nothing() {
    let project = Project::new();
    let config = BridgeConfig {
        parse_mode: ParseMode::Strict,
        ..BridgeConfig::default()
    };
    let model = project.write_model("axioms/bad.fcm", "Model: a.b.bad\nParameters:\n  - x: ???\n");
    let mut store = ManifestStore::open(MemoryBackend::new()).expect("open");
    let err = generate_action(&project.paths, &config, &mut store, &model).expect_err("strict");
    assert!(matches!(
        err.downcast_ref::<BridgeError>(),
        Some(BridgeError::Parse { .. })
    ));
    assert!(!project.paths.actions_dir().exists());
    assert!(store.backend().persisted().is_none());
}

#[test]
fn failed_publish_keeps_previous_bundle_and_manifest() {
    let project = Project::new();
    let model = project.write_model("axioms/commit.fcm", COMMIT_MODEL);
    let mut store = project.store();
    generate_action(&project.paths, &project.config, &mut store, &model).expect("first");
    let before = project.read("actions/git/create-commit/action.yml");
    let manifest_before = project.read(".bridge/manifest.json");

    // Change the model, then block the sync record path with a directory.
    fs::write(&model, COMMIT_MODEL.replace("Create a git commit", "Changed")).expect("edit");
    let sync = project.paths.root().join("actions/git/create-commit/.bridge-sync");
    fs::remove_file(&sync).expect("remove sync");
    fs::create_dir_all(sync.join("blocker")).expect("block sync path");

    assert!(generate_action(&project.paths, &project.config, &mut store, &model).is_err());
    assert_eq!(project.read("actions/git/create-commit/action.yml"), before);
    assert_eq!(project.read(".bridge/manifest.json"), manifest_before);
}

#[test]
fn colliding_models_are_rejected_until_the_owner_is_removed() {
    let project = Project::new();
    let first = project.write_model("axioms/a/commit.fcm", COMMIT_MODEL);
    let second = project.write_model("axioms/b/commit.fcm", COMMIT_MODEL);
    let mut store = project.store();

    generate_action(&project.paths, &project.config, &mut store, &first).expect("first");
    let err = generate_action(&project.paths, &project.config, &mut store, &second)
        .expect_err("collision");
    assert!(err.to_string().contains("same action"), "{err}");

    fs::remove_file(&first).expect("remove first model");
    generate_action(&project.paths, &project.config, &mut store, &second).expect("takeover");
    assert!(store.artifact_for("axioms/a/commit.fcm").is_none());
    assert_eq!(
        store
            .record_for("actions/git/create-commit")
            .map(|r| r.source_path.as_str()),
        Some("axioms/b/commit.fcm")
    );
}

#[test]
fn discover_models_finds_only_fcm_files_sorted() {
    let project = Project::new();
    project.write_model("axioms/z/last.fcm", "Model: a.b.last\n");
    project.write_model("axioms/a/first.fcm", "Model: a.b.first\n");
    project.write_model("axioms/a/notes.md", "# not a model\n");
    let found = discover_models(&project.paths).expect("discover");
    let rels: Vec<_> = found
        .iter()
        .map(|path| project.paths.rel_path(path).expect("rel"))
        .collect();
    assert_eq!(rels, vec!["axioms/a/first.fcm", "axioms/z/last.fcm"]);
}
