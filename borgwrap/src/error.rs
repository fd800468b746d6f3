//! Typed failures raised by borgwrap components.
//!
//! Components return `anyhow::Result` and attach context freely. The retry loop and the
//! top-level dispatcher recover these types with `downcast_ref` to decide whether to retry
//! and which exit code to use.

use std::time::Duration;

use thiserror::Error;

use crate::io::hooks::HookPhase;

/// Exit code the engine uses for "finished, but with warnings".
pub const ENGINE_WARNING_CODE: i32 = 1;

/// The configuration document is malformed or incomplete.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config document must be a mapping")]
    NotAMapping,
    #[error("config does not match schema:\n- {}", .0.join("\n- "))]
    Schema(Vec<String>),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The engine's capabilities could not be determined.
#[derive(Debug, Error)]
pub enum VersionParseError {
    #[error("no version number found in engine output {0:?}")]
    NoVersion(String),
    #[error("engine version query failed: {0}")]
    Query(String),
}

/// The engine exited non-zero.
#[derive(Debug, Error)]
#[error("borg {action} failed with {}", exit_label(.exit_code))]
pub struct ExecutionError {
    pub action: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured stderr, if the invocation captured it.
    pub stderr: Option<String>,
}

impl ExecutionError {
    /// True when the engine reported a soft warning rather than a failure.
    pub fn is_warning(&self) -> bool {
        self.exit_code == Some(ENGINE_WARNING_CODE)
    }
}

/// The engine did not finish within its allotted time and was killed.
#[derive(Debug, Error)]
#[error("borg {action} timed out after {}s", .timeout.as_secs())]
pub struct TimeoutError {
    pub action: String,
    pub timeout: Duration,
}

/// A configured hook exited non-zero.
#[derive(Debug, Error)]
#[error("{phase} hook `{command}` failed with {}", hook_exit_label(.exit_code))]
pub struct HookFailedError {
    pub phase: HookPhase,
    pub command: String,
    pub exit_code: Option<i32>,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

/// Hooks have no exit code when signalled or when `sh` could not be started.
fn hook_exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}
