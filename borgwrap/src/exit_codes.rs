//! Stable exit codes for borgwrap commands.
//!
//! Engine failures that are not retried away exit with the engine's own code. The codes
//! below belong to the wrapper. `CHECK_WARNING` and the engine's warning code are both 1
//! but come from different programs and are never compared with each other.

use crate::error::{ExecutionError, HookFailedError};

/// Command succeeded.
pub const OK: i32 = 0;
/// Wrapper-level failure: invalid config, unknown engine version, spawn failure.
pub const INVALID: i32 = 1;
/// `check-age` found a stale or undersized archive.
pub const CHECK_WARNING: i32 = 1;
/// A before/after hook exited non-zero.
pub const HOOK_FAILED: i32 = 2;
/// `check-age` could not determine the state of the last archive.
pub const CHECK_UNKNOWN: i32 = 3;

/// Pick the process exit code for an error that reached the dispatcher.
pub fn for_error(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<HookFailedError>().is_some() {
        return HOOK_FAILED;
    }
    if let Some(exec) = err.downcast_ref::<ExecutionError>() {
        return exec.exit_code.unwrap_or(INVALID);
    }
    INVALID
}
