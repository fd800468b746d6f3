//! Monitoring-check evaluation of the most recent archive.
//!
//! Output follows the monitoring convention: the first line starts with
//! `BORGBACKUP OK`, `BORGBACKUP WARNING` or `BORGBACKUP UNKNOWN`, followed by a blank line
//! and a detail line.

use std::time::Duration;

use chrono::NaiveDateTime;

use crate::core::types::InfoDocument;
use crate::exit_codes;

/// Layout of `archives[].start` in engine JSON.
pub const ARCHIVE_START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Unknown,
}

impl CheckStatus {
    pub fn token(self) -> &'static str {
        match self {
            CheckStatus::Ok => "BORGBACKUP OK",
            CheckStatus::Warning => "BORGBACKUP WARNING",
            CheckStatus::Unknown => "BORGBACKUP UNKNOWN",
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            CheckStatus::Ok => exit_codes::OK,
            CheckStatus::Warning => exit_codes::CHECK_WARNING,
            CheckStatus::Unknown => exit_codes::CHECK_UNKNOWN,
        }
    }
}

/// Result of a check, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub status: CheckStatus,
    pub summary: String,
    pub detail: String,
}

impl CheckReport {
    pub fn new(status: CheckStatus, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn unknown(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(CheckStatus::Unknown, summary, detail)
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }

    pub fn render(&self) -> String {
        format!("{}: {}\n\n{}", self.status.token(), self.summary, self.detail)
    }
}

/// Thresholds for `check-age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeLimits {
    pub max_age: Duration,
    /// Minimum original size in MiB.
    pub min_size_mib: Option<u64>,
}

impl AgeLimits {
    pub fn from_hours(max_age_hours: u64, min_size_mib: Option<u64>) -> Self {
        Self {
            max_age: Duration::from_secs(max_age_hours.saturating_mul(3600)),
            min_size_mib,
        }
    }
}

/// Judge the newest archive in `info` against `limits` at local time `now`.
///
/// Age is checked before size.
pub fn evaluate(info: &InfoDocument, now: NaiveDateTime, limits: &AgeLimits) -> CheckReport {
    let Some(archive) = info.archives.first() else {
        return CheckReport::unknown("no archive found", "the repository has no archives");
    };

    let start = match NaiveDateTime::parse_from_str(&archive.start, ARCHIVE_START_FORMAT) {
        Ok(start) => start,
        Err(err) => {
            return CheckReport::unknown(
                "cannot read archive start time",
                format!("{:?}: {err}", archive.start),
            );
        }
    };

    let elapsed_secs = (now - start).num_seconds();
    let max_age_secs = i64::try_from(limits.max_age.as_secs()).unwrap_or(i64::MAX);
    if elapsed_secs > max_age_secs {
        return CheckReport::new(
            CheckStatus::Warning,
            "last backup too old",
            format!(
                "{} is {}h old (limit {}h)",
                archive.start,
                elapsed_secs / 3600,
                max_age_secs / 3600
            ),
        );
    }

    let size_mib = archive.stats.original_size / MIB;
    if let Some(min_size_mib) = limits.min_size_mib
        && size_mib < min_size_mib
    {
        return CheckReport::new(
            CheckStatus::Warning,
            "last backup too small",
            format!("{size_mib} MiB < {min_size_mib} MiB"),
        );
    }

    CheckReport::new(
        CheckStatus::Ok,
        "last backup is recent",
        format!("{} ({} MiB)", archive.start, size_mib),
    )
}
