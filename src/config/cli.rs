//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Coordinator action
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Upload fresh configuration and start the coordinator service
    Start,
    /// Stop the coordinator service
    Stop,
}

/// ltdeploy - start and stop the coordinator of a load-test deployment
#[derive(Parser, Debug)]
#[command(name = "ltdeploy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// What to do with the coordinator
    #[arg(value_enum)]
    pub action: Action,

    /// Deployer configuration file (TOML)
    #[arg(short = 'c', long, env = "LTDEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    // === Inventory Options ===
    /// Directory holding the terraform state of the deployment
    #[arg(long)]
    pub terraform_dir: Option<PathBuf>,

    /// Read inventory from a `terraform output -json` dump
    #[arg(long)]
    pub inventory_file: Option<PathBuf>,

    // === Coordinator Options ===
    /// Baseline coordinator config (defaults to the built-in one)
    #[arg(long)]
    pub coordinator_config: Option<PathBuf>,

    // === SSH Options ===
    /// Remote login user
    #[arg(long)]
    pub ssh_user: Option<String>,

    /// Private key used to reach the hosts
    #[arg(long)]
    pub ssh_key: Option<PathBuf>,

    /// Remote SSH port
    #[arg(long)]
    pub ssh_port: Option<u16>,

    // === Runtime Options ===
    /// Skip the deployment precondition checks
    #[arg(long)]
    pub skip_preflight: bool,

    /// Resolve inventory and print the generated configs without touching any host
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dry_run && self.action == Action::Stop {
            anyhow::bail!("--dry-run is only supported for start");
        }

        if self.ssh_port == Some(0) {
            anyhow::bail!("ssh port must be between 1 and 65535");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        let cli = Cli::parse_from(["ltdeploy", "stop"]);
        assert_eq!(cli.action, Action::Stop);
        assert!(!cli.dry_run);
        assert!(cli.validate().is_ok());

        assert!(Cli::try_parse_from(["ltdeploy", "restart"]).is_err());
        assert!(Cli::try_parse_from(["ltdeploy"]).is_err());
    }

    #[test]
    fn test_validate_dry_run_stop() {
        let cli = Cli::parse_from(["ltdeploy", "stop", "--dry-run"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["ltdeploy", "start", "--dry-run"]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_validate_ssh_port() {
        let cli = Cli::parse_from(["ltdeploy", "start", "--ssh-port", "0"]);
        assert!(cli.validate().is_err());
    }
}
