//! CLI command definitions.
//!
//! Each subcommand reads a config file, runs one planner and prints the
//! result as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

pub mod compile_lifecycle;
pub mod plan_repository;
pub mod plan_vpc;
pub mod size_fargate;

/// awsx - plan AWS infrastructure components as plain data
#[derive(Parser)]
#[command(name = "awsx")]
#[command(version, about = "awsx - plan AWS infrastructure components as plain data")]
#[command(long_about = r#"
awsx computes the arguments of common AWS building blocks without talking to
AWS. Plans are printed as JSON for an orchestrator to apply.

COMMANDS:
  plan-vpc           → Lay out subnets, NAT gateways and routes for a VPC
  compile-lifecycle  → Compile ECR lifecycle rules into policy JSON
  plan-repository    → Plan an ECR repository and its lifecycle policy
  size-fargate       → Pick Fargate CPU/memory for a set of containers

CONFIG FILES:
  YAML (.yaml, .yml), JSON (.json) or TOML (.toml), chosen by extension.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Config error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan the subnets, NAT gateways and routes of a VPC
    #[command(name = "plan-vpc")]
    PlanVpc(plan_vpc::PlanVpcArgs),

    /// Compile lifecycle rules into an ECR policy document
    #[command(name = "compile-lifecycle")]
    CompileLifecycle(compile_lifecycle::CompileLifecycleArgs),

    /// Plan an ECR repository
    #[command(name = "plan-repository")]
    PlanRepository(plan_repository::PlanRepositoryArgs),

    /// Size a Fargate task from its containers
    #[command(name = "size-fargate")]
    SizeFargate(size_fargate::SizeFargateArgs),
}

/// Print `value` as pretty JSON, or write it to `output` when given.
pub async fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;

    match output {
        Some(path) => {
            tokio::fs::write(path, format!("{}\n", json))
                .await
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
