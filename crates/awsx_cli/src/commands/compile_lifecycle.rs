//! Compile lifecycle command - Turn simplified rules into ECR policy JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use awsx_ecr::{build_lifecycle_policy, LifecyclePolicyArgs};

use crate::config::load_config;

#[derive(Args)]
pub struct CompileLifecycleArgs {
    /// Lifecycle config file with a `rules` list
    #[arg(short, long)]
    config: PathBuf,

    /// Write the policy to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(args: CompileLifecycleArgs) -> Result<()> {
    let policy: LifecyclePolicyArgs = load_config(&args.config).await?;

    if policy.skip {
        warn!("Lifecycle policy is marked skip; compiling the rules anyway");
    }

    let document =
        build_lifecycle_policy(&policy.rules).context("Lifecycle policy validation failed")?;
    info!("Compiled {} lifecycle rule(s)", document.rules.len());

    super::emit(&document, args.output.as_deref()).await
}
