//! Configuration synthesis
//!
//! Maps inventory into the two documents the coordinator host needs.

use crate::coordinator::{CoordinatorConfig, LoadAgentConfig};
use crate::inventory::{AgentHost, MetricsServer};
use crate::Result;

/// Port the load agent API listens on
pub const AGENT_API_PORT: u16 = 4000;

/// Port Prometheus listens on
pub const PROMETHEUS_PORT: u16 = 9090;

/// API endpoint of one agent on the private network
pub fn agent_api_url(agent: &AgentHost) -> String {
    format!("http://{}:{}", agent.private_ip, AGENT_API_PORT)
}

/// Prometheus endpoint of the metrics server on the private network
pub fn prometheus_url(metrics: &MetricsServer) -> String {
    format!("http://{}:{}", metrics.private_ip, PROMETHEUS_PORT)
}

/// One load agent entry per agent host, in inventory order
pub fn load_agent_configs(agents: &[AgentHost]) -> Vec<LoadAgentConfig> {
    agents
        .iter()
        .map(|agent| LoadAgentConfig {
            id: agent.name.clone(),
            api_url: agent_api_url(agent),
        })
        .collect()
}

/// Point `baseline` at this deployment's agents and metrics server
///
/// Only `ClusterConfig.Agents` and `MonitorConfig.PrometheusURL` change.
/// Every other key, value and key position of the baseline is kept.
pub fn coordinator_config(
    mut baseline: CoordinatorConfig,
    agents: &[LoadAgentConfig],
    metrics: &MetricsServer,
) -> Result<CoordinatorConfig> {
    baseline.set_agents(agents)?;
    baseline.set_prometheus_url(prometheus_url(metrics))?;
    Ok(baseline)
}
