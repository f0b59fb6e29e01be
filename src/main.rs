//! ltdeploy CLI entry point

use anyhow::{Context, Result};
use ltdeploy::config::cli::{Action, Cli};
use ltdeploy::config::{toml, validator, DeployerConfig};
use ltdeploy::deploy::{AGENT_CONFIG_PATH, COORDINATOR_CONFIG_PATH};
use ltdeploy::{DeployFailure, Deployer};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();
    cli.validate()?;

    init_logging(cli.debug);
    debug!(version = env!("CARGO_PKG_VERSION"), "ltdeploy starting");

    // Build configuration (file first, CLI takes precedence)
    let config = load_config(&cli)?;
    validator::validate_config(&config).context("Configuration validation failed")?;

    let deployer = Deployer::from_config(&config, cli.skip_preflight);

    if cli.dry_run {
        return run_dry(&deployer);
    }

    let result = match cli.action {
        Action::Start => deployer.start_coordinator().map(|report| report.steps),
        Action::Stop => deployer.stop_coordinator().map(|report| report.steps),
    };

    match result {
        Ok(steps) => {
            debug!(steps = steps.len(), "all steps completed");
            Ok(())
        }
        Err(failure) => {
            report_failure(&failure);
            Err(failure.into())
        }
    }
}

/// Load the deployer configuration and apply CLI overrides
fn load_config(cli: &Cli) -> Result<DeployerConfig> {
    let config = match cli.config {
        Some(ref path) => toml::parse_toml_file(path)?,
        None => DeployerConfig::default(),
    };

    Ok(toml::merge_cli_with_config(cli, config))
}

/// Print the generated documents without contacting any host
fn run_dry(deployer: &Deployer) -> Result<()> {
    let plan = match deployer.plan_start() {
        Ok(plan) => plan,
        Err(failure) => {
            report_failure(&failure);
            return Err(failure.into());
        }
    };

    println!("Coordinator host: {}", plan.address);
    println!();
    println!("{}:", AGENT_CONFIG_PATH);
    println!("{}", plan.agent_config_json);
    println!();
    println!("{}:", COORDINATOR_CONFIG_PATH);
    println!("{}", plan.coordinator_config_json);
    println!();
    println!("Dry run mode - nothing was uploaded");

    Ok(())
}

fn report_failure(failure: &DeployFailure) {
    let completed: Vec<String> = failure.completed.iter().map(|s| s.to_string()).collect();
    error!(completed = ?completed, "{}", failure);
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
