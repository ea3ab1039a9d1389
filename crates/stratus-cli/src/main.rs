use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stratus_core::{DeploymentTarget, SourceLayout};

mod commands;
mod stacks;

use stacks::{StackContext, StackKind};

#[derive(Parser, Debug)]
#[command(name = "stratus", version, about = "Stratus CLI")]
struct Cli {
    /// Active environment name (local, ci, dev, qa, stage, prod).
    #[arg(long = "env", env = "ENV_NAME", global = true)]
    env_name: Option<String>,

    /// YAML environment registry. Defaults to the built-in registry.
    #[arg(long, global = true)]
    environments: Option<PathBuf>,

    /// Root of the function sources.
    #[arg(long, default_value = "src/lambda", global = true)]
    source_root: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize stacks into deployable templates.
    Synth {
        /// Stack to synthesize.
        #[arg(long, value_enum, default_value_t = StackKind::All)]
        stack: StackKind,

        /// Output directory for `{StackId}.template.json` files.
        #[arg(long, default_value = "cdk.out")]
        out: PathBuf,
    },

    /// Print the prefixed resource name and parameter path for a base name.
    Names {
        base: String,
    },

    /// List the registered environments.
    Environments,

    /// Validate template files against the embedded template schema.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = commands::load_registry(cli.environments.as_deref())?;

    match cli.cmd {
        Command::Synth { stack, out } => {
            let environment = registry
                .select(cli.env_name.as_deref())
                .context("Failed to select the active environment")?
                .clone();
            let ctx = StackContext {
                environment,
                target: DeploymentTarget::from_env(),
                layout: SourceLayout::new(cli.source_root),
            };
            commands::synth::run(stack, &ctx, &out)?;
        }
        Command::Names { base } => {
            let environment = registry
                .select(cli.env_name.as_deref())
                .context("Failed to select the active environment")?;
            commands::names::run(&base, environment);
        }
        Command::Environments => commands::environments::run(&registry),
        Command::Check { files } => commands::check::run(&files)?,
    }

    Ok(())
}
