//! Plan VPC command - Lay out a VPC from a config file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use awsx_net::{StaticZones, VpcArgs, VpcPlanner};

use crate::config::load_config;

#[derive(Args)]
pub struct PlanVpcArgs {
    /// Name of the VPC; prefixes every planned resource
    #[arg(short, long)]
    name: String,

    /// VPC config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Availability zones of the target region, comma separated
    #[arg(long, value_delimiter = ',')]
    zones: Vec<String>,

    /// Write the plan to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(args: PlanVpcArgs) -> Result<()> {
    info!("Planning VPC: {}", args.name);

    let vpc_args: VpcArgs = match &args.config {
        Some(path) => load_config(path).await?,
        None => VpcArgs::default(),
    };

    let planner = VpcPlanner::new(Arc::new(StaticZones::new(args.zones)));
    let plan = planner
        .plan(&args.name, &vpc_args)
        .with_context(|| format!("VPC validation failed for '{}'", args.name))?;

    info!(
        "Planned {} subnets, {} NAT gateways and {} routes",
        plan.subnets.len(),
        plan.nat_gateways.len(),
        plan.routes.len()
    );

    super::emit(&plan, args.output.as_deref()).await
}
