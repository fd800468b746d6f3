//! Pure mapping from configuration and intent to engine argument lists.
//!
//! Nothing here touches the filesystem or spawns processes. The exclusion file used by
//! `create` is created by the caller and passed in as a path.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::core::config::Config;
use crate::core::version::EngineVersion;

/// Timestamp layout of synthesized archive names.
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One engine invocation, fully described: `borg [action] args.. [target] trailing..`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Engine subcommand; `None` for version queries and raw passthrough.
    pub action: Option<&'static str>,
    pub args: Vec<String>,
    /// Positional repository, or `REPO::ARCHIVE` for create.
    pub target: Option<String>,
    pub trailing: Vec<String>,
}

impl EngineCommand {
    /// Arguments after the engine binary, in the order they are passed.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + self.trailing.len() + 2);
        if let Some(action) = self.action {
            argv.push(action.to_string());
        }
        argv.extend(self.args.iter().cloned());
        if let Some(target) = &self.target {
            argv.push(target.clone());
        }
        argv.extend(self.trailing.iter().cloned());
        argv
    }

    /// Short name for logs and error messages.
    pub fn label(&self) -> &'static str {
        self.action.unwrap_or("command")
    }
}

/// Flags requested on the command line for `create`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub dry_run: bool,
    pub stats: bool,
    pub list: bool,
}

/// Flags requested on the command line for `prune`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneOptions {
    pub dry_run: bool,
    pub stats: bool,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            stats: true,
        }
    }
}

/// `<prefix>-<UTC timestamp>`, or the bare timestamp without a prefix.
pub fn archive_name(prefix: Option<&str>, now: DateTime<Utc>) -> String {
    let stamp = now.format(ARCHIVE_TIMESTAMP_FORMAT);
    match non_empty(prefix) {
        Some(prefix) => format!("{prefix}-{stamp}"),
        None => stamp.to_string(),
    }
}

/// `borg create` for a new archive named `archive`.
///
/// `exclude_from` must point at a file that stays alive until the invocation finishes.
pub fn create(
    config: &Config,
    version: EngineVersion,
    options: &CreateOptions,
    exclude_from: Option<&Path>,
    archive: &str,
) -> EngineCommand {
    let location = &config.location;
    let remote = &config.remote;
    let mut args = Vec::new();

    if let Some(compression) = &remote.compression {
        push_pair(&mut args, "--compression", compression);
    }
    if let Some(ratelimit) = remote.ratelimit {
        let flag = if version.uses_upload_ratelimit() {
            "--upload-ratelimit"
        } else {
            "--remote-ratelimit"
        };
        push_pair(&mut args, flag, &ratelimit.to_string());
    }
    if location.one_file_system {
        args.push("--one-file-system".to_string());
    }
    if location.exclude_caches {
        args.push("--exclude-caches".to_string());
    }
    if location.keep_exclude_tags {
        args.push("--keep-exclude-tags".to_string());
    }
    for marker in &location.exclude_if_present {
        push_pair(&mut args, "--exclude-if-present", marker);
    }
    if location.noatime && !version.noatime_is_default() {
        args.push("--noatime".to_string());
    }
    if let Some(path) = exclude_from {
        push_pair(&mut args, "--exclude-from", &path.display().to_string());
    }
    if options.dry_run {
        args.push("--dry-run".to_string());
    }
    if options.stats {
        args.push("--stats".to_string());
    }
    if options.list {
        args.push("--list".to_string());
    }

    EngineCommand {
        action: Some("create"),
        args,
        target: Some(format!("{}::{archive}", remote.repository)),
        trailing: location.source.clone(),
    }
}

/// `borg list` restricted to this wrapper's archives.
pub fn list(config: &Config, version: EngineVersion) -> EngineCommand {
    EngineCommand {
        action: Some("list"),
        args: archive_selector(config.remote.prefix.as_deref(), version),
        target: Some(config.remote.repository.clone()),
        trailing: Vec::new(),
    }
}

/// `borg info --json` over this wrapper's archives, for the detailed listing.
pub fn list_details(config: &Config, version: EngineVersion) -> EngineCommand {
    let mut args = vec!["--json".to_string()];
    args.extend(archive_selector(config.remote.prefix.as_deref(), version));
    EngineCommand {
        action: Some("info"),
        args,
        target: Some(config.remote.repository.clone()),
        trailing: Vec::new(),
    }
}

/// `borg prune` applying the configured retention rules.
pub fn prune(config: &Config, version: EngineVersion, options: &PruneOptions) -> EngineCommand {
    let mut args = vec!["--list".to_string()];
    args.extend(archive_selector(config.remote.prefix.as_deref(), version));
    if options.dry_run {
        args.push("--dry-run".to_string());
    }
    if options.stats {
        args.push("--stats".to_string());
    }
    for (flag, value) in config.retention.rules() {
        push_pair(&mut args, flag, &value.to_string());
    }
    EngineCommand {
        action: Some("prune"),
        args,
        target: Some(config.remote.repository.clone()),
        trailing: Vec::new(),
    }
}

/// `borg compact`, reclaiming space after prune on engines that need it.
pub fn compact(config: &Config) -> EngineCommand {
    EngineCommand {
        action: Some("compact"),
        args: Vec::new(),
        target: Some(config.remote.repository.clone()),
        trailing: Vec::new(),
    }
}

/// `borg info` for the single most recent archive, as JSON.
pub fn info_last(config: &Config) -> EngineCommand {
    EngineCommand {
        action: Some("info"),
        args: vec!["--last".to_string(), "1".to_string(), "--json".to_string()],
        target: Some(config.remote.repository.clone()),
        trailing: Vec::new(),
    }
}

/// `borg --version`.
pub fn version_query() -> EngineCommand {
    EngineCommand {
        action: None,
        args: vec!["--version".to_string()],
        target: None,
        trailing: Vec::new(),
    }
}

/// User-supplied arguments, forwarded verbatim.
pub fn passthrough(raw: &[String]) -> EngineCommand {
    EngineCommand {
        action: None,
        args: raw.to_vec(),
        target: None,
        trailing: Vec::new(),
    }
}

fn archive_selector(prefix: Option<&str>, version: EngineVersion) -> Vec<String> {
    match non_empty(prefix) {
        Some(prefix) if version.uses_glob_archives() => {
            vec!["--glob-archives".to_string(), format!("{prefix}*")]
        }
        Some(prefix) => vec!["--prefix".to_string(), prefix.to_string()],
        None => Vec::new(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: &str) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::path::PathBuf;

    const LEGACY: EngineVersion = EngineVersion::new(1, 1, 9);
    const CURRENT: EngineVersion = EngineVersion::new(1, 2, 0);

    fn full_config() -> Config {
        Config::from_document(&json!({
            "location": {
                "source": ["/home", "/etc"],
                "exclude": ["*.iso"],
                "exclude_if_present": [".nobackup", "CACHEDIR.TAG"],
                "exclude_caches": "yes",
                "keep_exclude_tags": true,
                "one_file_system": 1,
                "noatime": "true"
            },
            "remote": {
                "repository": "ssh://backup@host/./repo",
                "prefix": "host",
                "compression": "zstd,6",
                "ratelimit": 5000
            },
            "retention": {
                "keep_last": 3,
                "keep_within": "2d",
                "keep_daily": 7,
                "keep_monthly": 6
            }
        }))
        .expect("config")
    }

    fn minimal_config() -> Config {
        Config::from_document(&json!({
            "location": { "source": "/srv" },
            "remote": { "repository": "/repo" }
        }))
        .expect("config")
    }

    #[test]
    fn create_orders_flags_for_legacy_engine() {
        let exclude = PathBuf::from("/tmp/excludes");
        let cmd = create(
            &full_config(),
            LEGACY,
            &CreateOptions {
                dry_run: true,
                stats: true,
                list: true,
            },
            Some(&exclude),
            "host-2024-01-02T03:04:05Z",
        );
        assert_eq!(
            cmd.argv(),
            vec![
                "create",
                "--compression",
                "zstd,6",
                "--remote-ratelimit",
                "5000",
                "--one-file-system",
                "--exclude-caches",
                "--keep-exclude-tags",
                "--exclude-if-present",
                ".nobackup",
                "--exclude-if-present",
                "CACHEDIR.TAG",
                "--noatime",
                "--exclude-from",
                "/tmp/excludes",
                "--dry-run",
                "--stats",
                "--list",
                "ssh://backup@host/./repo::host-2024-01-02T03:04:05Z",
                "/home",
                "/etc",
            ]
        );
    }

    #[test]
    fn create_on_current_engine_renames_ratelimit_and_drops_noatime() {
        let cmd = create(
            &full_config(),
            CURRENT,
            &CreateOptions::default(),
            None,
            "host-x",
        );
        assert!(cmd.args.contains(&"--upload-ratelimit".to_string()));
        assert!(!cmd.args.contains(&"--remote-ratelimit".to_string()));
        assert!(!cmd.args.contains(&"--noatime".to_string()));
        assert!(!cmd.args.contains(&"--exclude-from".to_string()));
    }

    #[test]
    fn create_is_deterministic() {
        let cfg = full_config();
        let exclude = PathBuf::from("/tmp/excludes");
        let build = || {
            create(
                &cfg,
                LEGACY,
                &CreateOptions::default(),
                Some(&exclude),
                "host-x",
            )
            .argv()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn create_with_minimal_config_has_only_target_and_sources() {
        let cmd = create(
            &minimal_config(),
            CURRENT,
            &CreateOptions::default(),
            None,
            "2024-01-02T03:04:05Z",
        );
        assert_eq!(
            cmd.argv(),
            vec!["create", "/repo::2024-01-02T03:04:05Z", "/srv"]
        );
    }

    #[test]
    fn archive_name_uses_utc_seconds() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(archive_name(Some("host"), now), "host-2024-01-02T03:04:05Z");
        assert_eq!(archive_name(None, now), "2024-01-02T03:04:05Z");
        assert_eq!(archive_name(Some(""), now), "2024-01-02T03:04:05Z");
    }

    #[test]
    fn list_selects_by_prefix_or_glob() {
        let cfg = full_config();
        assert_eq!(
            list(&cfg, LEGACY).argv(),
            vec!["list", "--prefix", "host", "ssh://backup@host/./repo"]
        );
        assert_eq!(
            list(&cfg, CURRENT).argv(),
            vec!["list", "--glob-archives", "host*", "ssh://backup@host/./repo"]
        );
        assert_eq!(list(&minimal_config(), CURRENT).argv(), vec!["list", "/repo"]);
    }

    #[test]
    fn list_details_queries_info_as_json() {
        assert_eq!(
            list_details(&full_config(), CURRENT).argv(),
            vec![
                "info",
                "--json",
                "--glob-archives",
                "host*",
                "ssh://backup@host/./repo"
            ]
        );
    }

    #[test]
    fn prune_emits_rules_in_priority_order() {
        let cmd = prune(
            &full_config(),
            LEGACY,
            &PruneOptions {
                dry_run: true,
                stats: true,
            },
        );
        assert_eq!(
            cmd.argv(),
            vec![
                "prune",
                "--list",
                "--prefix",
                "host",
                "--dry-run",
                "--stats",
                "--keep-last",
                "3",
                "--keep-within",
                "2d",
                "--keep-daily",
                "7",
                "--keep-monthly",
                "6",
                "ssh://backup@host/./repo",
            ]
        );
    }

    #[test]
    fn prune_without_stats_or_rules() {
        let cmd = prune(
            &minimal_config(),
            CURRENT,
            &PruneOptions {
                dry_run: false,
                stats: false,
            },
        );
        assert_eq!(cmd.argv(), vec!["prune", "--list", "/repo"]);
    }

    #[test]
    fn fixed_queries() {
        let cfg = minimal_config();
        assert_eq!(
            info_last(&cfg).argv(),
            vec!["info", "--last", "1", "--json", "/repo"]
        );
        assert_eq!(compact(&cfg).argv(), vec!["compact", "/repo"]);
        assert_eq!(version_query().argv(), vec!["--version"]);
        assert_eq!(version_query().label(), "command");
    }

    #[test]
    fn passthrough_is_verbatim() {
        let raw = vec!["list".to_string(), "::host-x".to_string(), "--short".to_string()];
        let cmd = passthrough(&raw);
        assert_eq!(cmd.argv(), raw);
        assert_eq!(cmd.target, None);
    }
}
