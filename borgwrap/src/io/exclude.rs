//! Scoped exclusion-pattern file handed to `borg create --exclude-from`.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::debug;

/// Temporary file holding one exclusion pattern per line.
///
/// The file is deleted when the value is dropped, on success and failure paths alike, so
/// it must outlive the engine invocation that references it.
#[derive(Debug)]
pub struct ExcludeFile {
    file: NamedTempFile,
}

impl ExcludeFile {
    /// Write `patterns` to a fresh temporary file, or return `None` if there are none.
    pub fn create(patterns: &[String]) -> Result<Option<Self>> {
        if patterns.is_empty() {
            return Ok(None);
        }
        let mut file = tempfile::Builder::new()
            .prefix("borgwrap-exclude-")
            .tempfile()
            .context("create exclude file")?;
        for pattern in patterns {
            writeln!(file, "{pattern}").context("write exclude file")?;
        }
        file.flush().context("flush exclude file")?;
        debug!(path = %file.path().display(), count = patterns.len(), "wrote exclude file");
        Ok(Some(Self { file }))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
