//! `check-age`: monitoring check on the most recent archive.

use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{instrument, warn};

use crate::core::check_age::{AgeLimits, CheckReport, evaluate};
use crate::core::command;
use crate::core::types::InfoDocument;
use crate::error::TimeoutError;
use crate::io::engine::{Engine, Invocation};
use crate::io::hooks::HookRunner;
use crate::retry::Sleeper;
use crate::session::Session;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Query the newest archive and judge it at local time `now`.
///
/// Never fails: anything that prevents a verdict becomes an UNKNOWN report.
#[instrument(skip_all, fields(max_age_secs = limits.max_age.as_secs(), timeout_secs = timeout.as_secs()))]
pub fn run_check_age<E: Engine, H: HookRunner, S: Sleeper>(
    session: &Session<E, H, S>,
    limits: &AgeLimits,
    timeout: Duration,
    now: NaiveDateTime,
) -> CheckReport {
    let invocation = Invocation::new(command::info_last(&session.config))
        .capture_stdout()
        .with_timeout(timeout);

    let result = match session.engine.execute(&invocation) {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, "archive query failed");
            if err.downcast_ref::<TimeoutError>().is_some() {
                return CheckReport::unknown("archive query timed out", err.to_string());
            }
            return CheckReport::unknown("archive query failed", format!("{err:#}"));
        }
    };

    match InfoDocument::parse(result.stdout.as_deref().unwrap_or_default()) {
        Ok(info) => evaluate(&info, now, limits),
        Err(err) => CheckReport::unknown("cannot parse archive info", err.to_string()),
    }
}
