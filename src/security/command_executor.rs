//! SafeCommandExecutor: whitelisted, cancellable subprocess execution
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only the Dart and Flutter tools can execute
//! - **Injection prevention**: Arguments are passed as a vector, never through a shell
//! - **Secret hygiene**: Token-bearing environment variables are held as `SecretString`
//!   and only exposed to the child process
//! - **Working directory validation**: Validates existence before execution
//! - **Timeout and cancellation**: The child is killed when either fires
//!
//! # Example
//!
//! ```rust,no_run
//! use pub_publisher::security::{CommandRunner, Invocation, SafeCommandExecutor};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut executor = SafeCommandExecutor::new(".")?;
//! executor.set_timeout(Duration::from_secs(30));
//!
//! let output = executor
//!     .run(&Invocation::new("dart", ["--version"]), &CancellationToken::new())
//!     .await?;
//! println!("{}", output.stdout);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Commands the executor is allowed to run
const ALLOWED_COMMANDS: &[&str] = &["dart", "flutter"];

/// Errors that can occur during command execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {}", .0.display())]
    InvalidWorkingDirectory(PathBuf),

    /// Process could not be started or awaited (binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Process ran and exited unsuccessfully
    #[error("{message}")]
    Failed { message: String },

    /// Command exceeded the timeout duration
    #[error("Command timeout after {0:?}")]
    Timeout(Duration),

    /// Caller aborted the command
    #[error("Command cancelled")]
    Cancelled,
}

/// A single external tool invocation
#[derive(Debug, Default)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Environment variables carrying credentials
    pub secret_env: Vec<(String, SecretString)>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn secret_env(mut self, key: &str, value: SecretString) -> Self {
        self.secret_env.push((key.to_string(), value));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Boundary to the external SDK tools
///
/// Implementations return `Ok` only for a zero exit status and must honor
/// `cancel` by terminating the subprocess.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, CommandError>;
}

/// Safe command executor with security controls
#[derive(Debug)]
pub struct SafeCommandExecutor {
    /// Working directory where commands will be executed
    working_dir: PathBuf,
    /// Optional timeout for command execution
    timeout: Option<Duration>,
    allowed: Vec<&'static str>,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            timeout: None,
            allowed: ALLOWED_COMMANDS.to_vec(),
        })
    }

    /// Set command execution timeout.
    ///
    /// Commands exceeding this duration are killed.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    #[cfg(test)]
    fn allow(&mut self, command: &'static str) {
        self.allowed.push(command);
    }

    fn command_name(program: &str) -> String {
        // Flutter ships as a batch script on Windows
        #[cfg(target_os = "windows")]
        if program == "flutter" {
            return format!("{}.bat", program);
        }

        program.to_string()
    }
}

#[async_trait]
impl CommandRunner for SafeCommandExecutor {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, CommandError> {
        if !self.allowed.contains(&invocation.program.as_str()) {
            return Err(CommandError::CommandNotAllowed(invocation.program.clone()));
        }

        if cancel.is_cancelled() {
            return Err(CommandError::Cancelled);
        }

        debug!(command = %invocation, dir = %self.working_dir.display(), "Spawning command");

        let mut command = Command::new(Self::command_name(&invocation.program));
        command
            .args(&invocation.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in &invocation.env {
            command.env(key, value);
        }
        for (key, value) in &invocation.secret_env {
            command.env(key, value.expose_secret());
        }

        let child = command
            .spawn()
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        // Dropping the wait future drops the child, which kills it.
        let wait = child.wait_with_output();
        let result = match self.timeout {
            Some(limit) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CommandError::Cancelled),
                result = tokio::time::timeout(limit, wait) => {
                    result.map_err(|_| CommandError::Timeout(limit))?
                }
            },
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CommandError::Cancelled),
                result = wait => result,
            },
        };

        let output = result.map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(CommandError::Failed {
                message: failure_message(output.status, &stderr),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

/// Captured stderr followed by the exit status, or the status alone
fn failure_message(status: ExitStatus, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", stderr, status)
    }
}
