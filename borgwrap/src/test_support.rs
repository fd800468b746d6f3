//! Test-only fakes for the engine, hooks and sleeping, plus config builders.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::{Value, json};

use crate::core::config::Config;
use crate::core::version::EngineVersion;
use crate::error::{ExecutionError, TimeoutError};
use crate::io::engine::{Engine, ExecutionResult, Invocation};
use crate::io::hooks::HookRunner;
use crate::session::Session;

/// Predetermined outcome for one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedOutcome {
    Success { stdout: String, stderr: String },
    Failure { exit_code: Option<i32>, stderr: String },
    Timeout,
    SpawnError(String),
}

/// Exclusion file observed while an invocation was running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedExcludeFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Engine that records invocations and replays queued outcomes.
///
/// With an empty queue every invocation succeeds with empty output.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    outcomes: RefCell<VecDeque<ScriptedOutcome>>,
    invocations: RefCell<Vec<Invocation>>,
    exclude_files: RefCell<Vec<ObservedExcludeFile>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: ScriptedOutcome) {
        self.outcomes.borrow_mut().push_back(outcome);
    }

    pub fn push_success(&self) {
        self.push_stdout("");
    }

    pub fn push_stdout(&self, stdout: &str) {
        self.push(ScriptedOutcome::Success {
            stdout: stdout.to_string(),
            stderr: String::new(),
        });
    }

    pub fn push_stderr(&self, stderr: &str) {
        self.push(ScriptedOutcome::Success {
            stdout: String::new(),
            stderr: stderr.to_string(),
        });
    }

    pub fn push_failure(&self, exit_code: i32) {
        self.push_failure_with_stderr(exit_code, "");
    }

    pub fn push_failure_with_stderr(&self, exit_code: i32, stderr: &str) {
        self.push(ScriptedOutcome::Failure {
            exit_code: Some(exit_code),
            stderr: stderr.to_string(),
        });
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Argument lists of all invocations, in order.
    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.invocations
            .borrow()
            .iter()
            .map(|invocation| invocation.command.argv())
            .collect()
    }

    /// Engine subcommands of all invocations, `None` for version queries and passthrough.
    pub fn actions(&self) -> Vec<Option<&'static str>> {
        self.invocations
            .borrow()
            .iter()
            .map(|invocation| invocation.command.action)
            .collect()
    }

    pub fn exclude_files(&self) -> Vec<ObservedExcludeFile> {
        self.exclude_files.borrow().clone()
    }

    fn observe_exclude_file(&self, argv: &[String]) {
        let Some(index) = argv.iter().position(|arg| arg == "--exclude-from") else {
            return;
        };
        let Some(path) = argv.get(index + 1) else {
            return;
        };
        let path = PathBuf::from(path);
        let contents = fs::read_to_string(&path).unwrap_or_default();
        self.exclude_files
            .borrow_mut()
            .push(ObservedExcludeFile { path, contents });
    }
}

impl Engine for ScriptedEngine {
    fn execute(&self, invocation: &Invocation) -> Result<ExecutionResult> {
        self.invocations.borrow_mut().push(invocation.clone());
        self.observe_exclude_file(&invocation.command.argv());

        let outcome = self
            .outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(ScriptedOutcome::Success {
                stdout: String::new(),
                stderr: String::new(),
            });
        let action = invocation.command.label().to_string();
        let capture = invocation.capture;
        match outcome {
            ScriptedOutcome::Success { stdout, stderr } => Ok(ExecutionResult {
                exit_code: 0,
                stdout: capture.stdout.then_some(stdout),
                stderr: capture.stderr.then_some(stderr),
            }),
            ScriptedOutcome::Failure { exit_code, stderr } => Err(ExecutionError {
                action,
                exit_code,
                stderr: capture.stderr.then_some(stderr),
            }
            .into()),
            ScriptedOutcome::Timeout => Err(TimeoutError {
                action,
                timeout: invocation.timeout.unwrap_or_default(),
            }
            .into()),
            ScriptedOutcome::SpawnError(message) => Err(anyhow!(message)),
        }
    }
}

/// Hook runner that records commands and fails the ones it is told to.
#[derive(Debug, Default)]
pub struct ScriptedHookRunner {
    failures: Vec<(String, Option<i32>)>,
    ran: RefCell<Vec<String>>,
}

impl ScriptedHookRunner {
    pub fn failing(command: &str, exit_code: Option<i32>) -> Self {
        Self {
            failures: vec![(command.to_string(), exit_code)],
            ran: RefCell::new(Vec::new()),
        }
    }

    pub fn ran(&self) -> Vec<String> {
        self.ran.borrow().clone()
    }
}

impl HookRunner for ScriptedHookRunner {
    fn run(&self, command: &str) -> Result<Option<i32>> {
        self.ran.borrow_mut().push(command.to_string());
        let code = self
            .failures
            .iter()
            .find(|(failing, _)| failing == command)
            .map_or(Some(0), |(_, code)| *code);
        Ok(code)
    }
}

/// Sleeper that records requested durations instead of blocking.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl crate::retry::Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

pub type TestSession = Session<ScriptedEngine, ScriptedHookRunner, RecordingSleeper>;

/// Minimal valid document: one source, a repository and a `host` prefix.
pub fn document() -> Value {
    json!({
        "location": { "source": ["/home"] },
        "remote": { "repository": "/srv/repo", "prefix": "host" }
    })
}

/// Build a config from a document, panicking on invalid input.
pub fn config_from(document: &Value) -> Config {
    match Config::from_document(document) {
        Ok(config) => config,
        Err(err) => panic!("invalid test config: {err}"),
    }
}

pub fn config() -> Config {
    config_from(&document())
}

/// Session with scripted collaborators and a pre-seeded engine version.
pub fn session(config: Config, version: EngineVersion) -> TestSession {
    session_with_hooks(config, version, ScriptedHookRunner::default())
}

pub fn session_with_hooks(
    config: Config,
    version: EngineVersion,
    hooks: ScriptedHookRunner,
) -> TestSession {
    Session::new(
        config,
        ScriptedEngine::new(),
        hooks,
        RecordingSleeper::default(),
        false,
    )
    .with_version(version)
}

/// Same as [`session`] with dry-run enabled.
pub fn dry_run_session(config: Config, version: EngineVersion) -> TestSession {
    let mut session = session(config, version);
    session.dry_run = true;
    session
}

/// Strings from string literals.
pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
