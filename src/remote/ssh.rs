//! SSH remote executor
//!
//! Drives the system `ssh` client. Each call is a separate `ssh` invocation
//! against the same host with the same options:
//!
//! - `BatchMode=yes` so a missing key fails instead of prompting
//! - `ConnectTimeout` bounds session establishment
//! - optional identity file and port
//!
//! Uploads stream the payload over stdin into `cat > path` (or `cat >> path`
//! when appending), so no `scp`/`sftp` subsystem is needed on the host.

use super::{RemoteError, RemoteExecutor, RemoteSession};
use crate::config::SshConfig;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Remote executor backed by the `ssh` binary
#[derive(Debug, Clone)]
pub struct SshExecutor {
    /// ssh client binary
    binary: PathBuf,
    /// Remote login user
    user: String,
    /// Identity file passed with `-i`
    key_path: Option<PathBuf>,
    /// Remote port
    port: u16,
    /// `ConnectTimeout` in seconds
    connect_timeout_secs: u64,
    /// Enforce known_hosts checking
    strict_host_key_checking: bool,
}

impl SshExecutor {
    /// Create an executor from deployer SSH settings
    pub fn new(config: &SshConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            user: config.user.clone(),
            key_path: config.key_path.clone(),
            port: config.port,
            connect_timeout_secs: config.connect_timeout_secs,
            strict_host_key_checking: config.strict_host_key_checking,
        }
    }

    /// Arguments shared by every invocation against `address`
    ///
    /// Ends with the `user@host` destination; the remote command follows.
    pub fn base_args(&self, address: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
        ];

        if !self.strict_host_key_checking {
            args.push("-o".to_string());
            args.push("StrictHostKeyChecking=no".to_string());
            args.push("-o".to_string());
            args.push("UserKnownHostsFile=/dev/null".to_string());
        }

        if let Some(ref key) = self.key_path {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }

        args.push("-p".to_string());
        args.push(self.port.to_string());
        args.push(format!("{}@{}", self.user, address));
        args
    }

    fn command(&self, address: &str, remote_command: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(self.base_args(address)).arg("--").arg(remote_command);
        cmd
    }
}

impl RemoteExecutor for SshExecutor {
    fn connect(&self, address: &str) -> Result<Box<dyn RemoteSession>, RemoteError> {
        debug!(address, user = %self.user, "opening ssh session");

        // A no-op command proves reachability and authentication.
        let output = self
            .command(address, "true")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                RemoteError::new(
                    format!("failed to run {}: {}", self.binary.display(), e),
                    "",
                )
            })?;
        check_status(&output, &format!("ssh connection to {} failed", address))?;

        Ok(Box::new(SshSession {
            executor: self.clone(),
            address: address.to_string(),
        }))
    }
}

/// Session bound to one host
pub struct SshSession {
    executor: SshExecutor,
    address: String,
}

impl RemoteSession for SshSession {
    fn address(&self) -> &str {
        &self.address
    }

    fn upload(&mut self, data: &[u8], dst_path: &str, append: bool) -> Result<String, RemoteError> {
        let redirect = if append { ">>" } else { ">" };
        let remote_command = format!("cat {} {}", redirect, shell_quote(dst_path));
        debug!(address = %self.address, path = dst_path, bytes = data.len(), append, "uploading file");

        let mut child = self
            .executor
            .command(&self.address, &remote_command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RemoteError::new(format!("failed to spawn ssh: {}", e), ""))?;

        // A remote side that exits early closes the pipe; keep going so its
        // output and exit status still get collected
        let write_result = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(data),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .map_err(|e| RemoteError::new(format!("failed to wait for ssh: {}", e), ""))?;
        let context = format!("upload to {} failed", dst_path);
        match write_result {
            Ok(()) => check_status(&output, &context),
            Err(e) => Err(RemoteError::new(
                format!("{}: {} (failed to stream upload: {})", context, output.status, e),
                combined_output(&output),
            )),
        }
    }

    fn run(&mut self, command: &str) -> Result<String, RemoteError> {
        debug!(address = %self.address, command, "running remote command");

        let output = self
            .executor
            .command(&self.address, command)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| RemoteError::new(format!("failed to run ssh: {}", e), ""))?;
        check_status(&output, &format!("command {:?} failed", command))
    }
}

/// Combined stdout then stderr
fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

fn check_status(output: &Output, context: &str) -> Result<String, RemoteError> {
    let text = combined_output(output);
    if output.status.success() {
        Ok(text)
    } else {
        Err(RemoteError::new(format!("{}: {}", context, output.status), text))
    }
}

/// Quote `s` for a POSIX shell
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> SshExecutor {
        SshExecutor::new(&SshConfig {
            user: "ubuntu".to_string(),
            key_path: Some(PathBuf::from("/keys/lt.pem")),
            port: 2222,
            connect_timeout_secs: 15,
            ..SshConfig::default()
        })
    }

    #[test]
    fn test_base_args() {
        let args = executor().base_args("1.2.3.4");
        assert_eq!(args.last().unwrap(), "ubuntu@1.2.3.4");
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert!(args.contains(&"ConnectTimeout=15".to_string()));
        assert!(args.contains(&"StrictHostKeyChecking=no".to_string()));

        let key = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[key + 1], "/keys/lt.pem");
        let port = args.iter().position(|a| a == "-p").unwrap();
        assert_eq!(args[port + 1], "2222");
    }

    #[test]
    fn test_base_args_strict_without_key() {
        let exec = SshExecutor::new(&SshConfig {
            strict_host_key_checking: true,
            key_path: None,
            ..SshConfig::default()
        });
        let args = exec.base_args("host");
        assert!(!args.iter().any(|a| a.starts_with("StrictHostKeyChecking")));
        assert!(!args.contains(&"-i".to_string()));
        assert!(args.contains(&"22".to_string()));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/home/ubuntu/a b.json"), "'/home/ubuntu/a b.json'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_missing_binary_is_connection_error() {
        let exec = SshExecutor::new(&SshConfig {
            binary: PathBuf::from("/nonexistent/ssh-binary"),
            ..SshConfig::default()
        });
        let err = exec.connect("127.0.0.1").err().unwrap();
        assert!(err.message.contains("failed to run"));
        assert!(err.output.is_empty());
    }

    #[cfg(unix)]
    fn fake_ssh(dir: &tempfile::TempDir) -> SshExecutor {
        use std::os::unix::fs::PermissionsExt;

        // Connects fine, but every other command fails before reading stdin
        let script = dir.path().join("ssh");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             for last; do :; done\n\
             if [ \"$last\" = true ]; then exit 0; fi\n\
             echo \"bash: /home/ubuntu/missing/config.json: No such file or directory\" >&2\n\
             exit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        SshExecutor::new(&SshConfig {
            binary: script,
            ..SshConfig::default()
        })
    }

    #[cfg(unix)]
    #[test]
    fn test_upload_failure_keeps_remote_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut session = fake_ssh(&dir).connect("127.0.0.1").unwrap();

        let err = session.upload(b"{}", "/home/ubuntu/missing/config.json", false).unwrap_err();
        assert!(err.message.contains("upload to /home/ubuntu/missing/config.json failed"));
        assert!(err.output.contains("No such file or directory"));
    }

    #[cfg(unix)]
    #[test]
    fn test_large_upload_to_closed_pipe_keeps_remote_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut session = fake_ssh(&dir).connect("127.0.0.1").unwrap();

        // Larger than any pipe buffer, so the write hits a closed pipe
        let data = vec![b'x'; 4 * 1024 * 1024];
        let err = session.upload(&data, "/home/ubuntu/missing/config.json", false).unwrap_err();
        assert!(err.message.contains("upload to /home/ubuntu/missing/config.json failed"));
        assert!(err.output.contains("No such file or directory"));
    }
}
