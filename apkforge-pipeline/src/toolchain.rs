//! External toolchain invocation
//!
//! Runs one command at a time on behalf of a job. Every invocation carries
//! its own working directory and environment overrides; the process-wide
//! current directory is never read or changed, so jobs running side by side
//! cannot execute commands against each other's trees.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// A single external command
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Directory the command runs in
    pub working_dir: PathBuf,
    /// Overrides merged over the inherited environment
    pub env: HashMap<String, String>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            env: HashMap::new(),
            timeout: Duration::from_secs(600),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &HashMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Human-readable command line, used in logs and error messages
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Failure of an external command
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("'{command}' could not be started: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("'{command}' exited with code {exit_code}")]
    Failed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("'{command}' timed out after {}s", timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },
}

impl ToolchainError {
    pub fn command(&self) -> &str {
        match self {
            ToolchainError::Spawn { command, .. }
            | ToolchainError::Failed { command, .. }
            | ToolchainError::TimedOut { command, .. } => command,
        }
    }

    pub fn stderr(&self) -> Option<&str> {
        match self {
            ToolchainError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ToolchainError::TimedOut { .. })
    }
}

/// Runs external commands for the pipeline
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Runs the command to completion
    ///
    /// A non-zero exit status is an error carrying the captured stderr.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ToolchainError>;
}

/// Toolchain backed by real subprocesses
#[derive(Debug, Clone, Default)]
pub struct ProcessToolchain;

impl ProcessToolchain {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Toolchain for ProcessToolchain {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ToolchainError> {
        let command = invocation.command_line();
        debug!(
            "Running '{}' in {}",
            command,
            invocation.working_dir.display()
        );

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| ToolchainError::Spawn {
            command: command.clone(),
            source,
        })?;

        // Dropping the child on timeout kills it
        let output = match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await
        {
            Ok(result) => result.map_err(|source| ToolchainError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => {
                return Err(ToolchainError::TimedOut {
                    command,
                    timeout: invocation.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        if !stdout.trim().is_empty() {
            debug!("'{}' stdout: {}", command, stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!("'{}' stderr: {}", command, stderr.trim());
        }

        if !output.status.success() {
            // Flutter reports most failures on stdout
            let stderr = if stderr.trim().is_empty() {
                stdout
            } else {
                stderr
            };
            return Err(ToolchainError::Failed {
                command,
                exit_code,
                stderr,
            });
        }

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}
