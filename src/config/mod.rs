//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//!
//! The deployer configuration says where the terraform deployment lives, how
//! to reach hosts over SSH, and which baseline coordinator config to use.
//! Every section has defaults, so an empty file is a valid configuration.

pub mod cli;
pub mod toml;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete deployer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployerConfig {
    #[serde(default)]
    pub terraform: TerraformConfig,
    #[serde(default)]
    pub ssh: SshConfig,
    #[serde(default)]
    pub coordinator: CoordinatorSettings,
}

/// Where to find the provisioned deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerraformConfig {
    /// Directory holding the terraform state of the deployment
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
    /// terraform binary
    #[serde(default = "default_terraform_binary")]
    pub binary: PathBuf,
    /// Read inventory from this `terraform output -json` dump instead of
    /// invoking terraform
    #[serde(default)]
    pub inventory_file: Option<PathBuf>,
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_terraform_binary() -> PathBuf {
    PathBuf::from("terraform")
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            binary: default_terraform_binary(),
            inventory_file: None,
        }
    }
}

/// SSH transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshConfig {
    /// ssh client binary
    #[serde(default = "default_ssh_binary")]
    pub binary: PathBuf,
    /// Remote login user
    #[serde(default = "default_ssh_user")]
    pub user: String,
    /// Private key; falls back to the ssh agent / ssh config when unset
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Freshly provisioned hosts are not in known_hosts, so this is off by default
    #[serde(default)]
    pub strict_host_key_checking: bool,
}

fn default_ssh_binary() -> PathBuf {
    PathBuf::from("ssh")
}

fn default_ssh_user() -> String {
    "ubuntu".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            binary: default_ssh_binary(),
            user: default_ssh_user(),
            key_path: None,
            port: default_ssh_port(),
            connect_timeout_secs: default_connect_timeout(),
            strict_host_key_checking: false,
        }
    }
}

/// Coordinator deployment settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorSettings {
    /// Baseline coordinator config; the built-in default is used when unset
    #[serde(default)]
    pub config_path: Option<PathBuf>,
}
