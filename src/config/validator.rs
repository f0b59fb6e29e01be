//! Configuration validation

use super::*;
use anyhow::Result;

/// Validate complete configuration
pub fn validate_config(config: &DeployerConfig) -> Result<()> {
    validate_terraform(&config.terraform)?;
    validate_ssh(&config.ssh)?;
    validate_coordinator(&config.coordinator)?;

    Ok(())
}

/// Validate terraform settings
pub fn validate_terraform(terraform: &TerraformConfig) -> Result<()> {
    if terraform.binary.as_os_str().is_empty() {
        anyhow::bail!("terraform binary must not be empty");
    }

    if let Some(ref file) = terraform.inventory_file {
        if !file.is_file() {
            anyhow::bail!("inventory file {} does not exist", file.display());
        }
    }

    Ok(())
}

/// Validate SSH settings
pub fn validate_ssh(ssh: &SshConfig) -> Result<()> {
    if ssh.binary.as_os_str().is_empty() {
        anyhow::bail!("ssh binary must not be empty");
    }

    if ssh.user.trim().is_empty() {
        anyhow::bail!("ssh user must not be empty");
    }

    if ssh.port == 0 {
        anyhow::bail!("ssh port must be between 1 and 65535");
    }

    if ssh.connect_timeout_secs == 0 || ssh.connect_timeout_secs > 300 {
        anyhow::bail!(
            "ssh connect_timeout_secs must be between 1 and 300, got {}",
            ssh.connect_timeout_secs
        );
    }

    if let Some(ref key) = ssh.key_path {
        if !key.is_file() {
            anyhow::bail!("ssh key {} does not exist", key.display());
        }
    }

    Ok(())
}

/// Validate coordinator settings
pub fn validate_coordinator(coordinator: &CoordinatorSettings) -> Result<()> {
    if let Some(ref path) = coordinator.config_path {
        if !path.is_file() {
            anyhow::bail!("coordinator config {} does not exist", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&DeployerConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_ssh() {
        let mut ssh = SshConfig::default();
        ssh.port = 0;
        assert!(validate_ssh(&ssh).is_err());

        let mut ssh = SshConfig::default();
        ssh.user = "  ".to_string();
        assert!(validate_ssh(&ssh).is_err());

        let mut ssh = SshConfig::default();
        ssh.connect_timeout_secs = 0;
        assert!(validate_ssh(&ssh).is_err());
        ssh.connect_timeout_secs = 301;
        let err = validate_ssh(&ssh).unwrap_err();
        assert!(err.to_string().contains("got 301"));
    }

    #[test]
    fn test_validate_missing_files() {
        let mut config = DeployerConfig::default();
        config.ssh.key_path = Some(PathBuf::from("/nonexistent/key.pem"));
        assert!(validate_config(&config).is_err());

        let mut config = DeployerConfig::default();
        config.coordinator.config_path = Some(PathBuf::from("/nonexistent/coordinator.json"));
        assert!(validate_config(&config).is_err());

        let mut config = DeployerConfig::default();
        config.terraform.inventory_file = Some(PathBuf::from("/nonexistent/output.json"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_existing_files() {
        let key = tempfile::NamedTempFile::new().unwrap();
        let mut config = DeployerConfig::default();
        config.ssh.key_path = Some(key.path().to_path_buf());
        config.coordinator.config_path = Some(key.path().to_path_buf());
        assert!(validate_config(&config).is_ok());
    }
}
