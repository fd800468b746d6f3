//! Bounded retry loop around fallible engine operations.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::core::config::RemoteConfig;
use crate::error::ExecutionError;

/// Attempt budget and inter-attempt wait, computed once per action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPlan {
    pub max_attempts: u32,
    pub wait: Duration,
}

impl RetryPlan {
    pub fn from_config(remote: &RemoteConfig) -> Self {
        Self {
            max_attempts: remote.retries.saturating_add(1),
            wait: Duration::from_secs(remote.retry_wait.saturating_mul(60)),
        }
    }
}

/// Blocks between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Run `op` until it succeeds or `plan` is exhausted.
///
/// `op` receives the 1-based attempt number. An engine warning (exit code 1) is returned
/// at once; every other failure is retried and the last one is returned unchanged.
pub fn run_with_retry<T, S, F>(label: &str, plan: &RetryPlan, sleeper: &S, mut op: F) -> Result<T>
where
    S: Sleeper,
    F: FnMut(u32) -> Result<T>,
{
    let max_attempts = plan.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        debug!(label, attempt, max_attempts, "starting attempt");
        let err = match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if err
            .downcast_ref::<ExecutionError>()
            .is_some_and(ExecutionError::is_warning)
        {
            warn!(label, attempt, "engine finished with warnings, not retrying");
            return Err(err);
        }

        eprintln!("{label} failed (attempt {attempt}/{max_attempts}): {err:#}");
        if attempt >= max_attempts {
            return Err(err);
        }

        if plan.wait.is_zero() {
            eprintln!("retrying");
        } else {
            eprintln!("waiting {} minutes before retrying", plan.wait.as_secs() / 60);
            sleeper.sleep(plan.wait);
        }
        attempt += 1;
    }
}
