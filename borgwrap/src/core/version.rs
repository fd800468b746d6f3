//! Engine version and the capability switches derived from it.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::VersionParseError;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("version pattern is valid"));

/// `major.minor.patch` reported by the engine. Ordering is lexicographic on the triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// First release with glob archive selection, `--upload-ratelimit`, default noatime
/// and a separate `compact` step.
pub const GLOB_ARCHIVES_SINCE: EngineVersion = EngineVersion::new(1, 2, 0);

impl EngineVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Extract the first `major.minor.patch` group from free-form version output.
    pub fn parse(text: &str) -> Result<Self, VersionParseError> {
        let captures = VERSION_PATTERN
            .captures(text)
            .ok_or_else(|| VersionParseError::NoVersion(text.trim().to_string()))?;
        let part = |index: usize| -> Result<u32, VersionParseError> {
            captures[index]
                .parse()
                .map_err(|_| VersionParseError::NoVersion(text.trim().to_string()))
        };
        Ok(Self::new(part(1)?, part(2)?, part(3)?))
    }

    /// Archives are selected with `--glob-archives 'PREFIX*'` instead of `--prefix`.
    pub fn uses_glob_archives(self) -> bool {
        self >= GLOB_ARCHIVES_SINCE
    }

    /// The rate limit flag is `--upload-ratelimit` instead of `--remote-ratelimit`.
    pub fn uses_upload_ratelimit(self) -> bool {
        self >= GLOB_ARCHIVES_SINCE
    }

    /// The engine already skips atime updates, so `--noatime` is redundant.
    pub fn noatime_is_default(self) -> bool {
        self >= GLOB_ARCHIVES_SINCE
    }

    /// Space freed by prune is only reclaimed by a separate `compact` run.
    pub fn needs_compact(self) -> bool {
        self >= GLOB_ARCHIVES_SINCE
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_engine_banner() {
        let version = EngineVersion::parse("borgbackup 1.2.4\n").expect("parse");
        assert_eq!(version, EngineVersion::new(1, 2, 4));
        assert_eq!(version.to_string(), "1.2.4");
    }

    #[test]
    fn takes_first_triple() {
        let version = EngineVersion::parse("borg 1.1.18 (python 3.11.2)").expect("parse");
        assert_eq!(version, EngineVersion::new(1, 1, 18));
    }

    #[test]
    fn rejects_output_without_triple() {
        let err = EngineVersion::parse("borg 2.0").unwrap_err();
        assert!(matches!(err, VersionParseError::NoVersion(_)));
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(EngineVersion::new(1, 1, 18) < EngineVersion::new(1, 2, 0));
        assert!(EngineVersion::new(1, 10, 0) > EngineVersion::new(1, 9, 99));
        assert!(EngineVersion::new(2, 0, 0) > EngineVersion::new(1, 99, 99));
    }

    #[test]
    fn capabilities_switch_at_one_two() {
        let legacy = EngineVersion::new(1, 1, 9);
        assert!(!legacy.uses_glob_archives());
        assert!(!legacy.uses_upload_ratelimit());
        assert!(!legacy.noatime_is_default());
        assert!(!legacy.needs_compact());

        let current = EngineVersion::new(1, 2, 0);
        assert!(current.uses_glob_archives());
        assert!(current.uses_upload_ratelimit());
        assert!(current.noatime_is_default());
        assert!(current.needs_compact());
    }
}
