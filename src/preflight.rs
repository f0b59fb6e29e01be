//! Deployment precondition checks
//!
//! Run before any inventory read or remote contact. A failing check means the
//! local view of the deployment cannot be trusted, so nothing is attempted.

use crate::Result;
use anyhow::Context;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Name of the terraform state file in the deployment directory
pub const STATE_FILE: &str = "terraform.tfstate";

/// Precondition checker
pub trait PreflightCheck: Send + Sync {
    fn check(&self) -> Result<()>;
}

/// Accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPreflight;

impl PreflightCheck for NoopPreflight {
    fn check(&self) -> Result<()> {
        Ok(())
    }
}

/// Checks that the terraform deployment is usable
///
/// - the working directory exists
/// - the terraform binary runs
/// - the working directory holds a state file (the deployment was created)
#[derive(Debug, Clone)]
pub struct TerraformPreflight {
    binary: PathBuf,
    working_dir: PathBuf,
}

impl TerraformPreflight {
    pub fn new(binary: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            working_dir: working_dir.into(),
        }
    }
}

impl PreflightCheck for TerraformPreflight {
    fn check(&self) -> Result<()> {
        if !self.working_dir.is_dir() {
            anyhow::bail!(
                "deployment directory {} does not exist",
                self.working_dir.display()
            );
        }

        let status = Command::new(&self.binary)
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| {
                format!("terraform not found ({}), is it installed?", self.binary.display())
            })?;
        if !status.success() {
            anyhow::bail!("{} version exited with {}", self.binary.display(), status);
        }

        let state = self.working_dir.join(STATE_FILE);
        if !state.is_file() {
            anyhow::bail!(
                "no terraform state in {}, has the deployment been created?",
                self.working_dir.display()
            );
        }

        debug!(dir = %self.working_dir.display(), "preflight checks passed");
        Ok(())
    }
}

/// Checks that a saved inventory dump is present
#[derive(Debug, Clone)]
pub struct InventoryFilePreflight {
    path: PathBuf,
}

impl InventoryFilePreflight {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreflightCheck for InventoryFilePreflight {
    fn check(&self) -> Result<()> {
        if !self.path.is_file() {
            anyhow::bail!("inventory file {} does not exist", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_preflight() {
        assert!(NoopPreflight.check().is_ok());
    }

    #[test]
    fn test_terraform_preflight_missing_dir() {
        let check = TerraformPreflight::new("terraform", "/nonexistent/deployment");
        let err = check.check().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_terraform_preflight_missing_binary() {
        let dir = tempfile::TempDir::new().unwrap();
        let check = TerraformPreflight::new("/nonexistent/terraform", dir.path());
        let err = check.check().unwrap_err();
        assert!(err.to_string().contains("terraform not found"));
    }

    #[test]
    fn test_inventory_file_preflight() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(InventoryFilePreflight::new(file.path()).check().is_ok());
        assert!(InventoryFilePreflight::new("/nonexistent/output.json").check().is_err());
    }
}
