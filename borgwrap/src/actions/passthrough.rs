//! `cmd`: forward raw arguments to the engine with the repository preset.

use anyhow::Result;
use tracing::instrument;

use crate::core::command;
use crate::io::engine::{Engine, Invocation};
use crate::io::hooks::HookRunner;
use crate::retry::Sleeper;
use crate::session::Session;

/// Environment variable the engine reads as the default repository.
pub const REPO_ENV: &str = "BORG_REPO";

#[instrument(skip_all, fields(args = args.len()))]
pub fn run_passthrough<E: Engine, H: HookRunner, S: Sleeper>(
    session: &Session<E, H, S>,
    args: &[String],
) -> Result<()> {
    if session.dry_run {
        println!(
            "Not running \"{}\" as dry run is enabled.",
            args.join(" ")
        );
        return Ok(());
    }
    let invocation = Invocation::new(command::passthrough(args))
        .with_env(REPO_ENV, session.config.remote.repository.clone());
    session.engine.execute(&invocation)?;
    Ok(())
}
