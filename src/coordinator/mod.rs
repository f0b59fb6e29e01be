//! Coordinator configuration document
//!
//! The JSON file the remote coordinator service reads. This crate only ever
//! touches `ClusterConfig.Agents` and `MonitorConfig.PrometheusURL`, so the
//! baseline is held as a raw JSON document: every other key, number format
//! and key position is written back exactly as it was read.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Built-in baseline used when no config path is given
pub const DEFAULT_CONFIG_JSON: &str = include_str!("default.json");

/// Section holding the agent list
pub const CLUSTER_SECTION: &str = "ClusterConfig";
/// Section holding the metrics endpoint
pub const MONITOR_SECTION: &str = "MonitorConfig";

const AGENTS_KEY: &str = "Agents";
const PROMETHEUS_URL_KEY: &str = "PrometheusURL";

/// How the coordinator reaches one load agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadAgentConfig {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "ApiURL")]
    pub api_url: String,
}

/// Complete coordinator configuration
///
/// The top level is guaranteed to be an object holding `ClusterConfig` and
/// `MonitorConfig` objects.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    doc: Map<String, Value>,
}

impl CoordinatorConfig {
    /// Parse a coordinator config from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).context("Failed to parse coordinator config")?;
        Self::from_value(value)
    }

    /// Wrap an already parsed document
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(doc) = value else {
            anyhow::bail!("coordinator config must be a JSON object");
        };

        for section in [CLUSTER_SECTION, MONITOR_SECTION] {
            match doc.get(section) {
                Some(Value::Object(_)) => {}
                Some(_) => anyhow::bail!("coordinator config: {} must be an object", section),
                None => anyhow::bail!("coordinator config: missing {} section", section),
            }
        }

        Ok(Self { doc })
    }

    /// Top-level entry `key`, if present
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.doc.get(key)
    }

    /// Current `ClusterConfig.Agents`, if present
    pub fn agents(&self) -> Option<&Value> {
        self.section(CLUSTER_SECTION)?.get(AGENTS_KEY)
    }

    /// Current `MonitorConfig.PrometheusURL`, if it is a string
    pub fn prometheus_url(&self) -> Option<&str> {
        self.section(MONITOR_SECTION)?
            .get(PROMETHEUS_URL_KEY)?
            .as_str()
    }

    /// Replace `ClusterConfig.Agents`, keeping its position in the section
    pub fn set_agents(&mut self, agents: &[LoadAgentConfig]) -> Result<()> {
        let agents = serde_json::to_value(agents).context("Failed to serialize agent list")?;
        self.section_mut(CLUSTER_SECTION)?
            .insert(AGENTS_KEY.to_string(), agents);
        Ok(())
    }

    /// Replace `MonitorConfig.PrometheusURL`, keeping its position in the section
    pub fn set_prometheus_url(&mut self, url: impl Into<String>) -> Result<()> {
        self.section_mut(MONITOR_SECTION)?
            .insert(PROMETHEUS_URL_KEY.to_string(), Value::String(url.into()));
        Ok(())
    }

    /// Serialize as 2-space indented JSON
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.doc)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.doc)
    }

    fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.doc.get(name)?.as_object()
    }

    fn section_mut(&mut self, name: &str) -> Result<&mut Map<String, Value>> {
        self.doc
            .get_mut(name)
            .and_then(Value::as_object_mut)
            .with_context(|| format!("coordinator config: {} must be an object", name))
    }
}

/// The built-in baseline configuration
pub fn default_config() -> Result<CoordinatorConfig> {
    CoordinatorConfig::from_json(DEFAULT_CONFIG_JSON)
        .context("Built-in coordinator config is invalid")
}

/// Load the baseline configuration
///
/// `None` selects [`default_config`]; otherwise the file at `path` is read.
pub fn read_config(path: Option<&Path>) -> Result<CoordinatorConfig> {
    let Some(path) = path else {
        return default_config();
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read coordinator config: {}", path.display()))?;

    CoordinatorConfig::from_json(&contents)
        .with_context(|| format!("Failed to parse coordinator config: {}", path.display()))
}
