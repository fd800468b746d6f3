//! `list`: show this wrapper's archives, plainly or as a size table.

use anyhow::{Context, Result};
use tracing::instrument;

use crate::core::command;
use crate::core::format::{format_duration, format_size, render_table};
use crate::core::types::{ArchiveInfo, InfoDocument};
use crate::io::engine::{Engine, Invocation};
use crate::io::hooks::HookRunner;
use crate::retry::Sleeper;
use crate::session::Session;

pub const DETAIL_HEADERS: [&str; 6] = ["Name", "Orig", "Comp", "Dedup", "Files", "Duration"];

/// Plain engine listing, printed straight to the terminal.
#[instrument(skip_all)]
pub fn run_list<E: Engine, H: HookRunner, S: Sleeper>(session: &Session<E, H, S>) -> Result<()> {
    let version = session.version()?;
    session
        .engine
        .execute(&Invocation::new(command::list(&session.config, version)))?;
    Ok(())
}

/// Detailed listing: query archive info and print it as a table.
#[instrument(skip_all)]
pub fn run_list_details<E: Engine, H: HookRunner, S: Sleeper>(
    session: &Session<E, H, S>,
) -> Result<()> {
    print!("{}", list_details(session)?);
    Ok(())
}

/// Rendered table for the detailed listing.
pub fn list_details<E: Engine, H: HookRunner, S: Sleeper>(
    session: &Session<E, H, S>,
) -> Result<String> {
    let version = session.version()?;
    let invocation =
        Invocation::new(command::list_details(&session.config, version)).capture_stdout();
    let result = session.engine.execute(&invocation)?;
    let info = InfoDocument::parse(result.stdout.as_deref().unwrap_or_default())
        .context("parse archive info")?;
    Ok(details_table(&info.archives))
}

pub fn details_table(archives: &[ArchiveInfo]) -> String {
    let rows: Vec<Vec<String>> = archives
        .iter()
        .map(|archive| {
            vec![
                archive.name.clone(),
                format_size(archive.stats.original_size),
                format_size(archive.stats.compressed_size),
                format_size(archive.stats.deduplicated_size),
                archive.stats.nfiles.to_string(),
                format_duration(archive.duration),
            ]
        })
        .collect();
    render_table(&DETAIL_HEADERS, &rows)
}
