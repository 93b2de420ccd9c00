//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const COMMIT_MODEL: &str = "\
Model: axiom.git.create_commit
Version: 1.0.0
Layer: axiom
Domain: git
Capability: Create a git commit from staged changes

Parameters:
  - message: string
  - amend: boolean (optional)
  - mode: fast|slow

Outputs:
  - sha: Commit id

Interface:
  requirements: [git]
";

pub const VERSION_MODEL: &str = "\
Model: axiom.release.calculate_version
Version: 0.3.0
Capability: Compute the next semantic version
Parameters:
  - bump: major|minor|patch
  - prerelease: string (optional)
Outputs:
  - version
";

/// Scratch bridge project with helpers to drive the built binary.
pub struct BridgeProject {
    _dir: TempDir,
    pub root: PathBuf,
}

impl BridgeProject {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path().canonicalize().expect("canonical temp dir");
        Self { _dir: dir, root }
    }

    /// Project preloaded with the two standard models.
    pub fn with_models() -> Self {
        let project = Self::empty();
        project.write("axioms/git/create_commit.fcm", COMMIT_MODEL);
        project.write("axioms/release/calculate_version.fcm", VERSION_MODEL);
        project
    }

    pub fn write(&self, rel: &str, text: &str) -> PathBuf {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().expect("parent dir")).expect("create parent dir");
        fs::write(&path, text).expect("write file");
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root.join(rel)).unwrap_or_else(|err| panic!("read {rel}: {err}"))
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Run `fcm-bridge <args> --project-root <root>`.
    pub fn run(&self, args: &[&str]) -> Output {
        bridge_command(&self.root)
            .args(args)
            .arg("--project-root")
            .arg(&self.root)
            .output()
            .expect("run fcm-bridge")
    }

    pub fn manifest(&self) -> serde_json::Value {
        serde_json::from_str(&self.read(".bridge/manifest.json")).expect("parse manifest")
    }
}

/// The built binary with a quiet, deterministic environment.
pub fn bridge_command(cwd: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_fcm-bridge"));
    command.current_dir(cwd).env_remove("RUST_LOG");
    command
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
