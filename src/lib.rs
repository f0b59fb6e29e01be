//! ltdeploy - coordinator lifecycle for load-test deployments
//!
//! ltdeploy bridges the inventory of a provisioned load-test deployment to a
//! running coordinator service. It reads the terraform outputs, builds the
//! agent list and coordinator configuration, uploads them to the coordinator
//! host over SSH and starts or stops the `ltcoordinator` service there.
//!
//! # Architecture
//!
//! - **Inventory**: terraform output (or a saved dump) describing the hosts
//! - **Synthesis**: agent list and coordinator config derived from inventory
//! - **Remote execution**: uploads and commands over an SSH session
//! - **Deployer**: fail-fast sequencing of the above with per-step progress

pub mod config;
pub mod coordinator;
pub mod deploy;
pub mod error;
pub mod inventory;
pub mod preflight;
pub mod remote;

// Re-export commonly used types
pub use config::DeployerConfig;
pub use deploy::{Deployer, StartReport, Step, StopReport};
pub use error::{DeployError, DeployFailure};

/// Result type used for plumbing throughout ltdeploy
pub type Result<T> = anyhow::Result<T>;
