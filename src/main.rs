use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;
mod generate;
mod manifest;
mod model;
mod parse;
mod project;
mod staging;
mod sync;
mod util;
mod validate;
mod workflow;

use cli::{Command, RootArgs};

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Init(args) => workflow::run_init(args)?,
        Command::Generate(args) => workflow::run_generate(args)?,
        Command::Validate(args) => {
            if !workflow::run_validate(args)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Inspect(args) => workflow::run_inspect(args)?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
