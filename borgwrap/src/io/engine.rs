//! Engine abstraction for borg invocations.
//!
//! The [`Engine`] trait decouples actions from the real `borgbackup` binary. Tests use a
//! scripted engine that records invocations and returns predetermined outcomes.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::command::{self, EngineCommand};
use crate::core::version::EngineVersion;
use crate::error::{ExecutionError, TimeoutError, VersionParseError};
use crate::io::process::{Capture, run_command};

/// Default engine binary.
pub const DEFAULT_BINARY: &str = "borgbackup";

/// How long the version query may take.
pub const VERSION_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// One engine invocation plus how to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: EngineCommand,
    /// Variables set on the child in addition to the inherited environment.
    pub env: Vec<(String, String)>,
    pub capture: Capture,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(command: EngineCommand) -> Self {
        Self {
            command,
            env: Vec::new(),
            capture: Capture::default(),
            timeout: None,
        }
    }

    pub fn capture_stdout(mut self) -> Self {
        self.capture.stdout = true;
        self
    }

    pub fn capture_stderr(mut self) -> Self {
        self.capture.stderr = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Outcome of a successful (exit code 0) invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

/// Abstraction over engine backends.
pub trait Engine {
    /// Run one invocation.
    ///
    /// Fails with [`ExecutionError`] on a non-zero exit and with [`TimeoutError`] when the
    /// invocation's timeout elapses.
    fn execute(&self, invocation: &Invocation) -> Result<ExecutionResult>;
}

/// Engine that spawns the real borg binary.
#[derive(Debug, Clone)]
pub struct BorgEngine {
    binary: String,
    rsh: Option<String>,
}

impl BorgEngine {
    pub fn new(binary: impl Into<String>, rsh: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            rsh,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn build_command(&self, invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(invocation.command.argv());
        if let Some(rsh) = &self.rsh {
            cmd.env("BORG_RSH", rsh);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl Engine for BorgEngine {
    #[instrument(skip_all, fields(action = invocation.command.label(), timeout_secs = invocation.timeout.map(|t| t.as_secs())))]
    fn execute(&self, invocation: &Invocation) -> Result<ExecutionResult> {
        let action = invocation.command.label();
        info!(binary = %self.binary, "running borg {action}");
        debug!(argv = ?invocation.command.argv(), "engine argv");

        let output = run_command(
            self.build_command(invocation),
            invocation.capture,
            invocation.timeout,
        )
        .with_context(|| format!("run {} {action}", self.binary))?;

        let stdout = output.stdout.map(|out| String::from_utf8_lossy(&out).into_owned());
        let stderr = output.stderr.map(|err| String::from_utf8_lossy(&err).into_owned());

        if output.timed_out {
            let timeout = invocation.timeout.unwrap_or_default();
            warn!(timeout_secs = timeout.as_secs(), "borg {action} timed out");
            return Err(TimeoutError {
                action: action.to_string(),
                timeout,
            }
            .into());
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "borg {action} failed");
            return Err(ExecutionError {
                action: action.to_string(),
                exit_code: output.status.code(),
                stderr,
            }
            .into());
        }

        debug!("borg {action} completed successfully");
        Ok(ExecutionResult {
            exit_code: 0,
            stdout,
            stderr,
        })
    }
}

/// Ask the engine for its version.
///
/// Any failure, whether the query itself or finding a version in its output, is reported
/// as a [`VersionParseError`].
#[instrument(skip_all)]
pub fn probe_version<E: Engine>(engine: &E) -> Result<EngineVersion> {
    let invocation = Invocation::new(command::version_query())
        .capture_stdout()
        .with_timeout(VERSION_QUERY_TIMEOUT);
    let result = engine
        .execute(&invocation)
        .map_err(|err| VersionParseError::Query(format!("{err:#}")))?;
    let version = EngineVersion::parse(result.stdout.as_deref().unwrap_or_default())?;
    debug!(%version, "detected engine version");
    Ok(version)
}
