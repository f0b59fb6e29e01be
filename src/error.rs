//! Error types for coordinator deployment operations
//!
//! Every failure of `start_coordinator` / `stop_coordinator` is reported as a
//! [`DeployFailure`]: the [`DeployError`] that stopped the operation plus the
//! list of steps that had already completed on the remote side.

use crate::deploy::Step;
use crate::remote::RemoteError;
use std::fmt;

/// Why a deployment operation failed
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("preflight check failed: {0:#}")]
    Preflight(#[source] anyhow::Error),

    #[error("failed to read infrastructure output: {0:#}")]
    Inventory(#[source] anyhow::Error),

    #[error("there are no agent instances to run the coordinator")]
    EmptyFleet,

    #[error("failed to connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: RemoteError,
    },

    #[error("failed to load coordinator config: {0:#}")]
    ConfigLoad(#[source] anyhow::Error),

    #[error("failed to serialize {document}: {source}")]
    Serialize {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("error uploading file {path}, output: {output:?}: {source}")]
    Upload {
        path: String,
        output: String,
        #[source]
        source: RemoteError,
    },

    #[error("error running ssh command {command:?}: output: {output:?}, error: {source}")]
    ServiceControl {
        command: String,
        output: String,
        #[source]
        source: RemoteError,
    },
}

impl DeployError {
    /// Raw remote output attached to this error, if any
    pub fn remote_output(&self) -> Option<&str> {
        match self {
            DeployError::Upload { output, .. } | DeployError::ServiceControl { output, .. } => {
                Some(output)
            }
            DeployError::Connection { source, .. } => Some(&source.output),
            _ => None,
        }
    }
}

/// A failed operation together with how far it got
#[derive(Debug)]
pub struct DeployFailure {
    /// The error that aborted the operation
    pub error: DeployError,
    /// Steps that completed before the failure, in execution order
    pub completed: Vec<Step>,
}

impl DeployFailure {
    pub fn new(error: DeployError, completed: Vec<Step>) -> Self {
        Self { error, completed }
    }

    /// Last step that completed, if any
    pub fn last_completed(&self) -> Option<Step> {
        self.completed.last().copied()
    }
}

impl fmt::Display for DeployFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for DeployFailure {
    // Display is the error's own message, so skip straight to its cause
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

/// Result type for deployment operations
pub type DeployResult<T> = std::result::Result<T, DeployFailure>;
