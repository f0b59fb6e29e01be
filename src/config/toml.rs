//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<DeployerConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<DeployerConfig> {
    let config: DeployerConfig = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: DeployerConfig) -> DeployerConfig {
    // Terraform settings
    if let Some(ref dir) = cli.terraform_dir {
        config.terraform.working_dir = dir.clone();
    }
    if let Some(ref file) = cli.inventory_file {
        config.terraform.inventory_file = Some(file.clone());
    }

    // SSH settings
    if let Some(ref user) = cli.ssh_user {
        config.ssh.user = user.clone();
    }
    if let Some(ref key) = cli.ssh_key {
        config.ssh.key_path = Some(key.clone());
    }
    if let Some(port) = cli.ssh_port {
        config.ssh.port = port;
    }

    // Baseline coordinator config
    if let Some(ref path) = cli.coordinator_config {
        config.coordinator.config_path = Some(path.clone());
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_parse_toml_empty_uses_defaults() {
        let config = parse_toml_string("").unwrap();
        assert_eq!(config, DeployerConfig::default());
        assert_eq!(config.ssh.user, "ubuntu");
        assert_eq!(config.ssh.port, 22);
        assert_eq!(config.terraform.binary, PathBuf::from("terraform"));
        assert!(config.coordinator.config_path.is_none());
    }

    #[test]
    fn test_parse_toml_full() {
        let toml = r#"
[terraform]
working_dir = "/srv/loadtest"
inventory_file = "/srv/loadtest/output.json"

[ssh]
user = "admin"
key_path = "/keys/lt.pem"
port = 2222
connect_timeout_secs = 30
strict_host_key_checking = true

[coordinator]
config_path = "/srv/loadtest/coordinator.json"
"#;

        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.terraform.working_dir, PathBuf::from("/srv/loadtest"));
        assert_eq!(
            config.terraform.inventory_file,
            Some(PathBuf::from("/srv/loadtest/output.json"))
        );
        assert_eq!(config.ssh.user, "admin");
        assert_eq!(config.ssh.port, 2222);
        assert_eq!(config.ssh.connect_timeout_secs, 30);
        assert!(config.ssh.strict_host_key_checking);
        assert_eq!(
            config.coordinator.config_path,
            Some(PathBuf::from("/srv/loadtest/coordinator.json"))
        );
    }

    #[test]
    fn test_parse_toml_rejects_bad_types() {
        assert!(parse_toml_string("[ssh]\nport = \"twenty-two\"\n").is_err());
    }

    #[test]
    fn test_parse_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ssh]\nuser = \"root\"").unwrap();

        let config = parse_toml_file(file.path()).unwrap();
        assert_eq!(config.ssh.user, "root");

        let err = parse_toml_file(Path::new("/nonexistent/ltdeploy.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_merge_cli_overrides_file() {
        let config = parse_toml_string("[ssh]\nuser = \"admin\"\nport = 2222\n").unwrap();
        let cli = Cli::parse_from([
            "ltdeploy",
            "start",
            "--ssh-user",
            "ubuntu",
            "--terraform-dir",
            "/tmp/deploy",
            "--coordinator-config",
            "/tmp/coordinator.json",
        ]);

        let merged = merge_cli_with_config(&cli, config);
        assert_eq!(merged.ssh.user, "ubuntu");
        // Not given on the command line, so the file value stays
        assert_eq!(merged.ssh.port, 2222);
        assert_eq!(merged.terraform.working_dir, PathBuf::from("/tmp/deploy"));
        assert_eq!(
            merged.coordinator.config_path,
            Some(PathBuf::from("/tmp/coordinator.json"))
        );
    }
}
