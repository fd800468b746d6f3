//! CLI tests for borgwrap subcommands.
//!
//! Spawns the borgwrap binary against a fake engine script and verifies exit codes,
//! monitoring output and the engine calls that were made.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use borgwrap::exit_codes;
use chrono::{Duration, Local};

/// Fake engine: logs each call as `argv|BORG_REPO`, answers `--version` and `info`, and
/// exits with `$FAKE_<ACTION>_EXIT` when set.
const FAKE_BORG: &str = r#"#!/bin/sh
echo "$*|$BORG_REPO" >> "$(dirname "$0")/calls.log"
case "$1" in
  --version) echo "borgbackup ${FAKE_VERSION:-1.2.4}" ;;
  create) exit "${FAKE_CREATE_EXIT:-0}" ;;
  prune) echo "Keeping archive: web-old" >&2; echo "Pruning archive: web-older" >&2; exit "${FAKE_PRUNE_EXIT:-0}" ;;
  info) printf '%s\n' "$FAKE_INFO" ;;
esac
exit 0
"#;

struct Fixture {
    temp: tempfile::TempDir,
}

impl Fixture {
    fn new(config: &str) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let borg = temp.path().join("borg");
        fs::write(&borg, FAKE_BORG).expect("write fake borg");
        let mut perms = fs::metadata(&borg).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&borg, perms).expect("chmod");
        fs::write(temp.path().join("backup.yaml"), config).expect("write config");
        Self { temp }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_borgwrap"));
        cmd.current_dir(self.temp.path())
            .env_remove("BORGWRAP_BORG")
            .env_remove("RUST_LOG")
            .env_remove("BORG_REPO")
            .arg("-c")
            .arg(self.path("backup.yaml"))
            .arg("--borg")
            .arg(self.path("borg"))
            .args(args);
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("run borgwrap")
    }

    fn calls(&self) -> Vec<String> {
        read_lines(&self.path("calls.log"))
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

const CONFIG: &str = "\
location:
  source: /srv
remote:
  repository: /backups/repo
  prefix: web
retention:
  keep_daily: 7
";

fn config_with_hooks(before: &str) -> String {
    format!("{CONFIG}hooks:\n  before:\n    - {before}\n  after:\n    - touch after-ran\n")
}

#[test]
fn create_runs_create_prune_and_compact() {
    let fixture = Fixture::new(CONFIG);
    let output = fixture.run(&["create"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let calls = fixture.calls();
    assert_eq!(calls.len(), 4, "{calls:?}");
    assert!(calls[0].starts_with("--version"));
    assert!(calls[1].starts_with("create "));
    assert!(calls[1].contains("/backups/repo::web-"));
    assert_eq!(
        calls[2],
        "prune --list --glob-archives web* --stats --keep-daily 7 /backups/repo|"
    );
    assert_eq!(calls[3], "compact /backups/repo|");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Pruning archive: web-older"));
    assert!(!stderr.contains("Keeping archive"));
}

#[test]
fn legacy_engine_skips_compact() {
    let fixture = Fixture::new(CONFIG);
    let output = fixture
        .command(&["prune"])
        .env("FAKE_VERSION", "1.1.17")
        .output()
        .expect("run borgwrap");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        fixture.calls()[1],
        "prune --list --prefix web --stats --keep-daily 7 /backups/repo|"
    );
    assert_eq!(fixture.calls().len(), 2);
}

#[test]
fn engine_failure_exit_code_is_propagated() {
    let fixture = Fixture::new(CONFIG);
    let output = fixture
        .command(&["create"])
        .env("FAKE_CREATE_EXIT", "2")
        .output()
        .expect("run borgwrap");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
    assert!(!fixture.calls().iter().any(|call| call.starts_with("prune")));
}

#[test]
fn engine_warning_exits_with_one() {
    let fixture = Fixture::new(CONFIG);
    let output = fixture
        .command(&["create", "--no-prune"])
        .env("FAKE_CREATE_EXIT", "1")
        .output()
        .expect("run borgwrap");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn failing_before_hook_exits_with_hook_code() {
    let fixture = Fixture::new(&config_with_hooks("exit 3"));
    let output = fixture.run(&["create"]);

    assert_eq!(output.status.code(), Some(exit_codes::HOOK_FAILED));
    assert_eq!(fixture.calls(), vec!["--version|"]);
    assert!(!fixture.path("after-ran").exists());
}

#[test]
fn hooks_run_around_create() {
    let fixture = Fixture::new(&config_with_hooks("touch before-ran"));
    let output = fixture.run(&["create", "--no-prune"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(fixture.path("before-ran").exists());
    assert!(fixture.path("after-ran").exists());
}

#[test]
fn dry_run_skips_hooks_and_marks_engine_calls() {
    let fixture = Fixture::new(&config_with_hooks("touch before-ran"));
    let output = fixture.run(&["-n", "create"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(!fixture.path("before-ran").exists());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Not running hook \"touch before-ran\" as dry run is enabled."));

    let calls = fixture.calls();
    assert!(calls[1].contains("--dry-run"));
    assert!(calls[2].starts_with("prune") && calls[2].contains("--dry-run"));
    assert!(!calls.iter().any(|call| call.starts_with("compact")));
}

#[test]
fn invalid_config_exits_invalid() {
    let fixture = Fixture::new("location:\n  source: /srv\nremote:\n  prefix: web\n");
    let output = fixture.run(&["list"]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(fixture.calls().is_empty());
}

#[test]
fn cmd_sets_repository_environment() {
    let fixture = Fixture::new(CONFIG);
    let output = fixture.run(&["cmd", "--", "list", "--short", "::web-1"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(fixture.calls(), vec!["list --short ::web-1|/backups/repo"]);
}

fn info_started(hours_ago: i64) -> String {
    let start = Local::now().naive_local() - Duration::hours(hours_ago);
    format!(
        r#"{{"archives": [{{"name": "web-1", "start": "{}", "stats": {{"original_size": 1048576}}}}]}}"#,
        start.format("%Y-%m-%dT%H:%M:%S%.6f")
    )
}

#[test]
fn check_age_reports_stale_backup() {
    let fixture = Fixture::new(CONFIG);
    let output = fixture
        .command(&["check-age", "--max-age", "6"])
        .env("FAKE_INFO", info_started(10))
        .output()
        .expect("run borgwrap");

    assert_eq!(output.status.code(), Some(exit_codes::CHECK_WARNING));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("BORGBACKUP WARNING: last backup too old"), "{stdout}");
    assert_eq!(fixture.calls(), vec!["info --last 1 --json /backups/repo|"]);
}

#[test]
fn nagios_alias_reports_recent_backup() {
    let fixture = Fixture::new(CONFIG);
    let output = fixture
        .command(&["nagios-check-age", "--max-age", "24"])
        .env("FAKE_INFO", info_started(10))
        .output()
        .expect("run borgwrap");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("BORGBACKUP OK"));
}

#[test]
fn check_age_with_missing_config_is_unknown() {
    let fixture = Fixture::new(CONFIG);
    let output = Command::new(env!("CARGO_BIN_EXE_borgwrap"))
        .arg("-c")
        .arg(fixture.path("missing.yaml"))
        .arg("--borg")
        .arg(fixture.path("borg"))
        .args(["check-age", "--max-age", "24"])
        .output()
        .expect("run borgwrap");

    assert_eq!(output.status.code(), Some(exit_codes::CHECK_UNKNOWN));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("BORGBACKUP UNKNOWN"));
}

#[test]
fn check_age_with_garbage_output_is_unknown() {
    let fixture = Fixture::new(CONFIG);
    let output = fixture
        .command(&["check-age", "--max-age", "24"])
        .env("FAKE_INFO", "not json")
        .output()
        .expect("run borgwrap");

    assert_eq!(output.status.code(), Some(exit_codes::CHECK_UNKNOWN));
}
