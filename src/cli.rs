//! CLI argument parsing for the model-to-action bridge.
//!
//! The CLI is thin: each subcommand maps to one workflow function.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "fcm-bridge",
    version,
    about = "Generate container actions from FCM models and validate that they stay in sync",
    after_help = "Examples:\n  fcm-bridge init --project-root .\n  fcm-bridge generate axioms/git/create_commit.fcm --project-root .\n  fcm-bridge generate --generate-all --project-root .\n  fcm-bridge validate --project-root .\n  fcm-bridge inspect axioms/git/create_commit.fcm",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Emit debug diagnostics on stderr (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Generate(GenerateArgs),
    Validate(ValidateArgs),
    Inspect(InspectArgs),
}

/// Project root shared by every project-scoped command.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project root containing the models and actions trees
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Write a default .bridge/config.json and create the source roots")]
pub struct InitArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Overwrite an existing config.json
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Generate the action bundle for one model or every model")]
pub struct GenerateArgs {
    /// Model file to generate (absolute, cwd-relative, or project-relative)
    #[arg(
        value_name = "MODEL",
        required_unless_present = "generate_all",
        conflicts_with = "generate_all"
    )]
    pub model: Option<PathBuf>,

    /// Generate every model discovered under the models root
    #[arg(long, visible_alias = "all")]
    pub generate_all: bool,

    #[command(flatten)]
    pub project: ProjectArgs,

    /// Treat malformed model text as an error instead of degrading it
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Check models, bundles, and manifest for consistency")]
pub struct ValidateArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print a parsed model as JSON")]
pub struct InspectArgs {
    /// Model file to parse
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Treat malformed model text as an error instead of degrading it
    #[arg(long)]
    pub strict: bool,
}
