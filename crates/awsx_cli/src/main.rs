//! awsx CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Config error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;

use commands::{Cli, Commands};
use config::ConfigError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const CONFIG_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays valid JSON.
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(log_filter(cli.verbose, cli.quiet))
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::PlanVpc(args) => commands::plan_vpc::execute(args).await,
        Commands::CompileLifecycle(args) => commands::compile_lifecycle::execute(args).await,
        Commands::PlanRepository(args) => commands::plan_repository::execute(args).await,
        Commands::SizeFargate(args) => commands::size_fargate::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Build the log filter. `RUST_LOG` is honoured for other targets; the awsx
/// level always follows `--verbose` / `--quiet`.
fn log_filter(verbose: bool, quiet: bool) -> EnvFilter {
    let awsx_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let mut filter = EnvFilter::from_default_env();
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        filter = filter.add_directive(LevelFilter::WARN.into());
    }
    match format!("awsx={}", awsx_level).parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.is::<ConfigError>() {
            return ExitCodes::CONFIG_ERROR;
        }
        if cause.is::<awsx_net::NetError>() || cause.is::<awsx_ecr::EcrError>() || cause.is::<awsx_ecs::EcsError>() {
            return ExitCodes::VALIDATION_FAILURE;
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("validation") {
        ExitCodes::VALIDATION_FAILURE
    } else if msg.contains("argument") || msg.contains("option") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_errors_map_to_config_code() {
        let err = anyhow::Error::new(ConfigError::NotFound(PathBuf::from("vpc.yaml")));
        assert_eq!(categorize_error(&err), ExitCodes::CONFIG_ERROR);
    }

    #[test]
    fn test_library_errors_map_to_validation_code() {
        let err = anyhow::Error::new(awsx_net::NetError::MissingAvailabilityZones).context("planning failed");
        assert_eq!(categorize_error(&err), ExitCodes::VALIDATION_FAILURE);

        let err = anyhow::Error::new(awsx_ecr::EcrError::TooManyAnyRules(2));
        assert_eq!(categorize_error(&err), ExitCodes::VALIDATION_FAILURE);
    }

    #[test]
    fn test_other_errors() {
        assert_eq!(categorize_error(&anyhow::anyhow!("invalid option --x")), ExitCodes::INVALID_ARGS);
        assert_eq!(categorize_error(&anyhow::anyhow!("disk full")), ExitCodes::GENERAL_ERROR);
    }

    #[test]
    fn test_log_flags_set_awsx_level() {
        assert!(log_filter(true, false).to_string().to_lowercase().contains("awsx=debug"));
        assert!(log_filter(false, true).to_string().to_lowercase().contains("awsx=warn"));
        assert!(log_filter(false, false).to_string().to_lowercase().contains("awsx=info"));
    }

    #[test]
    fn test_cli_parses_zone_list() {
        let cli = Cli::try_parse_from(["awsx", "plan-vpc", "--name", "main", "--zones", "a,b,c"]).unwrap();
        match cli.command {
            Commands::PlanVpc(_) => {}
            _ => panic!("expected plan-vpc"),
        }
        assert!(Cli::try_parse_from(["awsx", "size-fargate"]).is_err());
    }
}
