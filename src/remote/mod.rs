//! Remote execution abstraction
//!
//! The deployer never talks to a transport directly. It asks a
//! [`RemoteExecutor`] for a [`RemoteSession`] bound to one host and uses that
//! session for every upload and command of a single operation.
//!
//! # Implementations
//!
//! - **ssh**: drives the system `ssh` client (production)
//! - **mock**: records calls and fails on demand (tests, dry runs)
//!
//! # Example
//!
//! ```
//! use ltdeploy::remote::{RemoteExecutor, RemoteSession};
//! use ltdeploy::remote::mock::MockExecutor;
//!
//! let executor = MockExecutor::new();
//! let mut session = executor.connect("1.2.3.4")?;
//! session.upload(b"{}", "/tmp/config.json", false)?;
//! session.run("uptime")?;
//!
//! assert_eq!(executor.uploads().len(), 1);
//! assert_eq!(executor.commands()[0].command, "uptime");
//! # Ok::<(), ltdeploy::remote::RemoteError>(())
//! ```

pub mod mock;
pub mod ssh;

use std::fmt;

/// Failure of a remote operation
///
/// `output` holds whatever the remote side printed before failing, so callers
/// can surface it for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// Short description of what went wrong
    pub message: String,
    /// Combined stdout/stderr of the remote side
    pub output: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            output: output.into(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RemoteError {}

/// Opens sessions to remote hosts
///
/// Implementations must be `Send + Sync` so one executor can be shared by
/// independent deployer instances.
pub trait RemoteExecutor: Send + Sync {
    /// Open a session to `address`
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be reached or authentication fails.
    /// No upload or command has happened when this fails.
    fn connect(&self, address: &str) -> Result<Box<dyn RemoteSession>, RemoteError>;
}

/// A live session to one remote host
///
/// The session is released when dropped.
pub trait RemoteSession: Send {
    /// Host this session is bound to
    fn address(&self) -> &str;

    /// Write `data` to `dst_path` on the remote host
    ///
    /// When `append` is false the destination is truncated first. On success
    /// returns whatever the remote side printed (usually empty).
    fn upload(&mut self, data: &[u8], dst_path: &str, append: bool) -> Result<String, RemoteError>;

    /// Run a shell command and return its combined output
    ///
    /// A non-zero exit status is an error carrying the output.
    fn run(&mut self, command: &str) -> Result<String, RemoteError>;
}
