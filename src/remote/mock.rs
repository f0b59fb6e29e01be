//! Mock remote executor for testing
//!
//! This module provides an implementation of [`RemoteExecutor`] that never
//! touches the network. Every connect, upload and command is recorded in
//! call order so tests can assert exactly what reached the "remote" host.
//!
//! # Features
//!
//! - Records every call in order, shared across clones
//! - Fails connects, uploads to a given path, or a given command on demand
//! - Configurable output for successful commands

use super::{RemoteError, RemoteExecutor, RemoteSession};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One recorded interaction with the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Connect {
        address: String,
    },
    Upload {
        address: String,
        path: String,
        data: Vec<u8>,
        append: bool,
    },
    Run {
        address: String,
        command: String,
    },
}

/// Record of an upload for verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub address: String,
    pub path: String,
    pub data: Vec<u8>,
    pub append: bool,
}

impl UploadRecord {
    /// Uploaded bytes as UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Record of a command for verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub address: String,
    pub command: String,
}

#[derive(Default)]
struct MockState {
    calls: Vec<MockCall>,
    connect_failure: Option<RemoteError>,
    upload_failures: HashMap<String, RemoteError>,
    command_failures: HashMap<String, RemoteError>,
    command_outputs: HashMap<String, String>,
}

/// Mock remote executor
///
/// Clones share the same call log and failure configuration.
#[derive(Clone, Default)]
pub struct MockExecutor {
    state: Arc<Mutex<MockState>>,
}

impl MockExecutor {
    /// Create a mock where every operation succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `connect` fail with `error`
    pub fn fail_connect(&self, error: RemoteError) {
        self.state.lock().unwrap().connect_failure = Some(error);
    }

    /// Make uploads to `path` fail with `error`
    pub fn fail_upload(&self, path: impl Into<String>, error: RemoteError) {
        self.state
            .lock()
            .unwrap()
            .upload_failures
            .insert(path.into(), error);
    }

    /// Make `command` fail with `error`
    pub fn fail_command(&self, command: impl Into<String>, error: RemoteError) {
        self.state
            .lock()
            .unwrap()
            .command_failures
            .insert(command.into(), error);
    }

    /// Output returned when `command` succeeds
    pub fn set_command_output(&self, command: impl Into<String>, output: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .command_outputs
            .insert(command.into(), output.into());
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Addresses passed to `connect`, including failed attempts
    pub fn connects(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Connect { address } => Some(address),
                _ => None,
            })
            .collect()
    }

    /// Uploads attempted, including failed ones
    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Upload {
                    address,
                    path,
                    data,
                    append,
                } => Some(UploadRecord {
                    address,
                    path,
                    data,
                    append,
                }),
                _ => None,
            })
            .collect()
    }

    /// Commands attempted, including failed ones
    pub fn commands(&self) -> Vec<CommandRecord> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Run { address, command } => Some(CommandRecord { address, command }),
                _ => None,
            })
            .collect()
    }

    /// Forget all recorded calls, keeping failure configuration
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

impl RemoteExecutor for MockExecutor {
    fn connect(&self, address: &str) -> Result<Box<dyn RemoteSession>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall::Connect {
            address: address.to_string(),
        });
        if let Some(ref error) = state.connect_failure {
            return Err(error.clone());
        }

        Ok(Box::new(MockSession {
            address: address.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

/// Session handed out by [`MockExecutor`]
pub struct MockSession {
    address: String,
    state: Arc<Mutex<MockState>>,
}

impl RemoteSession for MockSession {
    fn address(&self) -> &str {
        &self.address
    }

    fn upload(&mut self, data: &[u8], dst_path: &str, append: bool) -> Result<String, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall::Upload {
            address: self.address.clone(),
            path: dst_path.to_string(),
            data: data.to_vec(),
            append,
        });

        match state.upload_failures.get(dst_path) {
            Some(error) => Err(error.clone()),
            None => Ok(String::new()),
        }
    }

    fn run(&mut self, command: &str) -> Result<String, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall::Run {
            address: self.address.clone(),
            command: command.to_string(),
        });

        if let Some(error) = state.command_failures.get(command) {
            return Err(error.clone());
        }
        Ok(state.command_outputs.get(command).cloned().unwrap_or_default())
    }
}
