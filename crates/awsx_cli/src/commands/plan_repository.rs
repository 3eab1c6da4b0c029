//! Plan repository command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use awsx_ecr::{plan_repository, RepositoryArgs};

use crate::config::load_config;

#[derive(Args)]
pub struct PlanRepositoryArgs {
    /// Resource name of the repository
    #[arg(short, long)]
    name: String,

    /// Repository config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the plan to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(args: PlanRepositoryArgs) -> Result<()> {
    let repository_args: RepositoryArgs = match &args.config {
        Some(path) => load_config(path).await?,
        None => RepositoryArgs::default(),
    };

    let plan = plan_repository(&args.name, &repository_args)
        .with_context(|| format!("Repository validation failed for '{}'", args.name))?;

    super::emit(&plan, args.output.as_deref()).await
}
