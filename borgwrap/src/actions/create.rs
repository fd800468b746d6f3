//! `create`: hooks around a retried archive creation, then prune.

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::actions::prune::run_prune;
use crate::core::command::{self, CreateOptions};
use crate::core::version::EngineVersion;
use crate::io::engine::{Engine, Invocation};
use crate::io::exclude::ExcludeFile;
use crate::io::hooks::{HookPhase, HookRunner, run_hooks};
use crate::retry::{Sleeper, run_with_retry};
use crate::session::Session;

/// Command-line choices for `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateRequest {
    pub stats: bool,
    pub list: bool,
    /// Prune after a successful create.
    pub prune: bool,
}

impl Default for CreateRequest {
    fn default() -> Self {
        Self {
            stats: false,
            list: false,
            prune: true,
        }
    }
}

#[instrument(skip_all, fields(dry_run = session.dry_run, prune = request.prune))]
pub fn run_create<E: Engine, H: HookRunner, S: Sleeper>(
    session: &Session<E, H, S>,
    request: &CreateRequest,
) -> Result<()> {
    let config = &session.config;
    let version = session.version()?;
    run_hooks(
        &session.hooks,
        HookPhase::Before,
        &config.hooks.before,
        session.dry_run,
    )?;

    create_archive(session, version, request)?;

    run_hooks(
        &session.hooks,
        HookPhase::After,
        &config.hooks.after,
        session.dry_run,
    )?;

    if request.prune {
        run_prune(session, true)?;
    }
    Ok(())
}

fn create_archive<E: Engine, H: HookRunner, S: Sleeper>(
    session: &Session<E, H, S>,
    version: EngineVersion,
    request: &CreateRequest,
) -> Result<()> {
    let config = &session.config;
    let options = CreateOptions {
        dry_run: session.dry_run,
        stats: request.stats,
        list: request.list,
    };
    let exclude = ExcludeFile::create(&config.location.exclude)?;
    let exclude_from = exclude.as_ref().map(ExcludeFile::path);

    run_with_retry(
        "create",
        &session.retry_plan(),
        &session.sleeper,
        |attempt| {
            let archive = command::archive_name(config.remote.prefix.as_deref(), Utc::now());
            debug!(attempt, archive = %archive, "creating archive");
            let cmd = command::create(config, version, &options, exclude_from, &archive);
            session.engine.execute(&Invocation::new(cmd))?;
            info!(archive = %archive, "archive created");
            Ok(())
        },
    )
}
