//! `prune`: apply retention rules, then compact on engines that need it.

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::command::{self, PruneOptions};
use crate::error::ExecutionError;
use crate::io::engine::{Engine, Invocation};
use crate::io::hooks::HookRunner;
use crate::retry::{Sleeper, run_with_retry};
use crate::session::Session;

const KEEPING_ARCHIVE: &str = "Keeping archive";

/// Drop the per-archive "Keeping archive" lines from the engine's prune listing.
pub fn filter_prune_output(stderr: &str) -> String {
    stderr
        .lines()
        .filter(|line| !line.starts_with(KEEPING_ARCHIVE))
        .map(|line| format!("{line}\n"))
        .collect()
}

/// Run prune with retries. Its stderr is captured and re-printed filtered, whether the
/// attempt succeeded or not.
#[instrument(skip_all, fields(dry_run = session.dry_run, stats))]
pub fn run_prune<E: Engine, H: HookRunner, S: Sleeper>(
    session: &Session<E, H, S>,
    stats: bool,
) -> Result<()> {
    let config = &session.config;
    let version = session.version()?;
    let options = PruneOptions {
        dry_run: session.dry_run,
        stats,
    };
    let invocation = Invocation::new(command::prune(config, version, &options)).capture_stderr();

    run_with_retry(
        "prune",
        &session.retry_plan(),
        &session.sleeper,
        |attempt| {
            debug!(attempt, "running prune");
            match session.engine.execute(&invocation) {
                Ok(result) => {
                    eprint!("{}", filter_prune_output(result.stderr.as_deref().unwrap_or_default()));
                    Ok(())
                }
                Err(err) => {
                    if let Some(stderr) = err
                        .downcast_ref::<ExecutionError>()
                        .and_then(|exec| exec.stderr.as_deref())
                    {
                        eprint!("{}", filter_prune_output(stderr));
                    }
                    Err(err)
                }
            }
        },
    )?;

    if !version.needs_compact() {
        return Ok(());
    }
    if session.dry_run {
        println!("Not running compact as dry run is enabled.");
        return Ok(());
    }
    session
        .engine
        .execute(&Invocation::new(command::compact(config)))
        .context("compact repository after prune")?;
    Ok(())
}
