//! Terraform-backed inventory
//!
//! Parses the JSON printed by `terraform output -json`:
//!
//! ```text
//! {
//!   "agents":        { "value": [ { "private_ip": "...", "public_ip": "...", "tags": { "Name": "..." } } ] },
//!   "metricsServer": { "value": { "private_ip": "..." } },
//!   "coordinator":   { "value": { "public_ip": "..." } }      (optional)
//! }
//! ```
//!
//! Outputs this crate does not use (app servers, proxy, database) are ignored.

use super::{AgentHost, CoordinatorHost, InfrastructureOutput, InventoryReader, MetricsServer};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RawOutput {
    #[serde(default)]
    agents: Option<OutputValue<Vec<RawInstance>>>,
    #[serde(rename = "metricsServer")]
    metrics_server: OutputValue<RawInstance>,
    #[serde(default)]
    coordinator: Option<OutputValue<RawInstance>>,
}

#[derive(Debug, Deserialize)]
struct OutputValue<T> {
    value: T,
}

#[derive(Debug, Default, Deserialize)]
struct RawInstance {
    #[serde(default)]
    private_ip: String,
    #[serde(default)]
    public_ip: String,
    #[serde(default)]
    tags: RawTags,
}

#[derive(Debug, Default, Deserialize)]
struct RawTags {
    #[serde(rename = "Name", default)]
    name: String,
}

/// Parse `terraform output -json` text into an inventory snapshot
pub fn parse_output(json: &str) -> Result<InfrastructureOutput> {
    let raw: RawOutput = serde_json::from_str(json)
        .context("Failed to parse terraform output")?;

    let agents = raw
        .agents
        .map(|agents| agents.value)
        .unwrap_or_default()
        .into_iter()
        .map(|instance| AgentHost {
            name: instance.tags.name,
            private_ip: instance.private_ip,
            public_ip: instance.public_ip,
        })
        .collect();

    Ok(InfrastructureOutput {
        agents,
        metrics_server: MetricsServer {
            private_ip: raw.metrics_server.value.private_ip,
        },
        coordinator: raw.coordinator.map(|c| CoordinatorHost {
            public_ip: c.value.public_ip,
        }),
    })
}

/// Reads inventory by running `terraform output -json` in the deployment directory
#[derive(Debug, Clone)]
pub struct TerraformInventory {
    binary: PathBuf,
    working_dir: PathBuf,
}

impl TerraformInventory {
    pub fn new(binary: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            working_dir: working_dir.into(),
        }
    }
}

impl InventoryReader for TerraformInventory {
    fn output(&self) -> Result<InfrastructureOutput> {
        debug!(dir = %self.working_dir.display(), "reading terraform output");

        let output = Command::new(&self.binary)
            .args(["output", "-json"])
            .current_dir(&self.working_dir)
            .output()
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "terraform output failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8(output.stdout)
            .context("terraform output is not valid UTF-8")?;
        parse_output(&stdout)
    }
}

/// Reads inventory from a saved `terraform output -json` dump
#[derive(Debug, Clone)]
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InventoryReader for FileInventory {
    fn output(&self) -> Result<InfrastructureOutput> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read inventory file: {}", self.path.display()))?;

        parse_output(&contents)
            .with_context(|| format!("Failed to parse inventory file: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const OUTPUT: &str = r#"{
  "agents": {
    "sensitive": false,
    "type": ["tuple", []],
    "value": [
      {"private_ip": "10.0.0.5", "public_ip": "1.2.3.4", "tags": {"Name": "agent-0"}},
      {"private_ip": "10.0.0.6", "public_ip": "1.2.3.5", "tags": {"Name": "agent-1"}}
    ]
  },
  "instances": {
    "value": [{"private_ip": "10.0.1.1", "public_ip": "2.2.2.2", "tags": {"Name": "app-0"}}]
  },
  "metricsServer": {
    "value": {"private_ip": "10.0.0.9", "public_ip": "3.3.3.3", "tags": {"Name": "metrics"}}
  }
}"#;

    #[test]
    fn test_parse_output() {
        let output = parse_output(OUTPUT).unwrap();
        assert_eq!(output.agents.len(), 2);
        assert_eq!(output.agents[0].name, "agent-0");
        assert_eq!(output.agents[0].private_ip, "10.0.0.5");
        assert_eq!(output.agents[0].public_ip, "1.2.3.4");
        assert_eq!(output.agents[1].name, "agent-1");
        assert_eq!(output.metrics_server.private_ip, "10.0.0.9");
        assert!(output.coordinator.is_none());
        assert_eq!(output.coordinator_address(), Some("1.2.3.4"));
    }

    #[test]
    fn test_parse_output_with_coordinator() {
        let json = r#"{
  "agents": {"value": [{"private_ip": "10.0.0.5", "public_ip": "1.2.3.4", "tags": {"Name": "agent-0"}}]},
  "metricsServer": {"value": {"private_ip": "10.0.0.9"}},
  "coordinator": {"value": {"public_ip": "5.6.7.8"}}
}"#;
        let output = parse_output(json).unwrap();
        assert_eq!(output.coordinator_address(), Some("5.6.7.8"));
    }

    #[test]
    fn test_parse_output_without_agents() {
        let json = r#"{"metricsServer": {"value": {"private_ip": "10.0.0.9"}}}"#;
        let output = parse_output(json).unwrap();
        assert!(output.agents.is_empty());

        let json = r#"{"agents": {"value": []}, "metricsServer": {"value": {"private_ip": "10.0.0.9"}}}"#;
        assert!(parse_output(json).unwrap().agents.is_empty());
    }

    #[test]
    fn test_parse_output_requires_metrics_server() {
        let json = r#"{"agents": {"value": []}}"#;
        assert!(parse_output(json).is_err());
        assert!(parse_output("not json").is_err());
    }

    #[test]
    fn test_file_inventory() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(OUTPUT.as_bytes()).unwrap();

        let reader = FileInventory::new(file.path());
        let output = reader.output().unwrap();
        assert_eq!(output.agents.len(), 2);

        let missing = FileInventory::new("/nonexistent/output.json");
        let err = missing.output().unwrap_err();
        assert!(err.to_string().contains("Failed to read inventory file"));
    }

    #[test]
    fn test_terraform_inventory_missing_binary() {
        let reader = TerraformInventory::new("/nonexistent/terraform", ".");
        assert!(reader.output().is_err());
    }
}
