//! Size Fargate command - Pick task CPU and memory for a set of containers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use awsx_ecs::{size_task, TaskSizingRequest};

use crate::config::load_config;

#[derive(Args)]
pub struct SizeFargateArgs {
    /// Task config file with a `containers` map
    #[arg(short, long)]
    config: PathBuf,

    /// Override the task CPU (docker units)
    #[arg(long)]
    cpu: Option<String>,

    /// Override the task memory (MB)
    #[arg(long)]
    memory: Option<String>,

    /// Write the sizing to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(args: SizeFargateArgs) -> Result<()> {
    let mut request: TaskSizingRequest = load_config(&args.config).await?;

    if args.cpu.is_some() {
        request.cpu = args.cpu;
    }
    if args.memory.is_some() {
        request.memory = args.memory;
    }
    debug!("Sizing {} container(s)", request.containers.len());

    let sizing = size_task(&request).context("Fargate sizing validation failed")?;

    super::emit(&sizing, args.output.as_deref()).await
}
