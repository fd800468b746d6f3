//! Hook runner adapter for configured `before`/`after` shell commands.

use std::fmt;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

use crate::error::HookFailedError;

/// When a hook runs relative to the main action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Before,
    After,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookPhase::Before => "before",
            HookPhase::After => "after",
        })
    }
}

/// Runs a single hook command and reports its exit code.
pub trait HookRunner {
    /// Returns the exit code, or `None` if the hook was killed by a signal.
    /// An error means the hook could not be started.
    fn run(&self, command: &str) -> Result<Option<i32>>;
}

/// Runs hooks through `sh -c` with inherited stdio.
pub struct ShellHookRunner;

impl HookRunner for ShellHookRunner {
    fn run(&self, command: &str) -> Result<Option<i32>> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .with_context(|| format!("spawn hook `{command}`"))?;
        Ok(status.code())
    }
}

/// Run `hooks` in order, stopping at the first failure.
///
/// Under dry-run nothing is executed; each hook is announced instead.
#[instrument(skip_all, fields(phase = %phase, count = hooks.len(), dry_run))]
pub fn run_hooks<H: HookRunner>(
    runner: &H,
    phase: HookPhase,
    hooks: &[String],
    dry_run: bool,
) -> Result<()> {
    for hook in hooks {
        if dry_run {
            println!("Not running hook \"{hook}\" as dry run is enabled.");
            continue;
        }
        debug!(hook = %hook, "running hook");
        let failed = HookFailedError {
            phase,
            command: hook.clone(),
            exit_code: None,
        };
        let exit_code = match runner.run(hook) {
            Ok(exit_code) => exit_code,
            Err(err) => {
                warn!(hook = %hook, error = %err, "hook could not be started");
                return Err(err.context(failed));
            }
        };
        if exit_code != Some(0) {
            warn!(hook = %hook, ?exit_code, "hook failed");
            return Err(HookFailedError { exit_code, ..failed }.into());
        }
    }
    Ok(())
}
