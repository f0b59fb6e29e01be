//! Infrastructure inventory
//!
//! A read-only snapshot of what the provisioner created: the load agents, the
//! metrics server and (optionally) a named coordinator host. The deployer
//! fetches a fresh snapshot at the start of every operation.
//!
//! # Readers
//!
//! - `terraform`: `terraform output -json` of the deployment, or a saved dump
//! - [`StaticInventory`]: an in-memory snapshot

pub mod terraform;

use crate::Result;

/// A load-generating agent host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentHost {
    /// Stable identifier (the instance `Name` tag)
    pub name: String,
    pub private_ip: String,
    pub public_ip: String,
}

/// The metrics-collection host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsServer {
    pub private_ip: String,
}

/// Explicitly named coordinator host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorHost {
    pub public_ip: String,
}

/// Provisioned topology
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfrastructureOutput {
    /// Agents in provisioning order
    pub agents: Vec<AgentHost>,
    pub metrics_server: MetricsServer,
    /// Dedicated coordinator reference, when the inventory provides one
    pub coordinator: Option<CoordinatorHost>,
}

impl InfrastructureOutput {
    /// Public address of the host that runs the coordinator
    ///
    /// An explicit coordinator entry wins. Otherwise the coordinator shares the
    /// first agent's host, which is how deployments are provisioned today.
    /// Returns `None` when there is neither.
    pub fn coordinator_address(&self) -> Option<&str> {
        if let Some(ref coordinator) = self.coordinator {
            return Some(&coordinator.public_ip);
        }
        self.agents.first().map(|agent| agent.public_ip.as_str())
    }

    pub fn has_agents(&self) -> bool {
        !self.agents.is_empty()
    }
}

/// Source of infrastructure output
pub trait InventoryReader: Send + Sync {
    /// Fetch the current topology
    fn output(&self) -> Result<InfrastructureOutput>;
}

/// Inventory held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    output: InfrastructureOutput,
}

impl StaticInventory {
    pub fn new(output: InfrastructureOutput) -> Self {
        Self { output }
    }
}

impl InventoryReader for StaticInventory {
    fn output(&self) -> Result<InfrastructureOutput> {
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str, private_ip: &str, public_ip: &str) -> AgentHost {
        AgentHost {
            name: name.to_string(),
            private_ip: private_ip.to_string(),
            public_ip: public_ip.to_string(),
        }
    }

    #[test]
    fn test_coordinator_address_is_first_agent() {
        let output = InfrastructureOutput {
            agents: vec![
                agent("agent-0", "10.0.0.5", "1.2.3.4"),
                agent("agent-1", "10.0.0.6", "1.2.3.5"),
            ],
            ..Default::default()
        };
        assert_eq!(output.coordinator_address(), Some("1.2.3.4"));
    }

    #[test]
    fn test_coordinator_address_explicit_host_wins() {
        let output = InfrastructureOutput {
            agents: vec![agent("agent-0", "10.0.0.5", "1.2.3.4")],
            coordinator: Some(CoordinatorHost {
                public_ip: "5.6.7.8".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(output.coordinator_address(), Some("5.6.7.8"));
    }

    #[test]
    fn test_coordinator_address_empty() {
        let output = InfrastructureOutput::default();
        assert!(!output.has_agents());
        assert_eq!(output.coordinator_address(), None);
    }

    #[test]
    fn test_static_inventory_returns_snapshot() {
        let output = InfrastructureOutput {
            agents: vec![agent("agent-0", "10.0.0.5", "1.2.3.4")],
            metrics_server: MetricsServer {
                private_ip: "10.0.0.9".to_string(),
            },
            coordinator: None,
        };
        let reader = StaticInventory::new(output.clone());
        assert_eq!(reader.output().unwrap(), output);
    }
}
