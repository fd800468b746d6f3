//! Per-process context shared by all actions.

use std::cell::OnceCell;

use anyhow::Result;

use crate::core::config::Config;
use crate::core::version::EngineVersion;
use crate::io::engine::{Engine, probe_version};
use crate::io::hooks::HookRunner;
use crate::retry::{RetryPlan, Sleeper};

/// Owns the configuration, the collaborators, and the engine version once known.
pub struct Session<E: Engine, H: HookRunner, S: Sleeper> {
    pub config: Config,
    pub engine: E,
    pub hooks: H,
    pub sleeper: S,
    pub dry_run: bool,
    version: OnceCell<EngineVersion>,
}

impl<E: Engine, H: HookRunner, S: Sleeper> Session<E, H, S> {
    pub fn new(config: Config, engine: E, hooks: H, sleeper: S, dry_run: bool) -> Self {
        Self {
            config,
            engine,
            hooks,
            sleeper,
            dry_run,
            version: OnceCell::new(),
        }
    }

    /// Seed the version so it is never probed.
    pub fn with_version(self, version: EngineVersion) -> Self {
        let _ = self.version.set(version);
        self
    }

    /// Engine version, probed on first use and cached for the session.
    pub fn version(&self) -> Result<EngineVersion> {
        if let Some(version) = self.version.get() {
            return Ok(*version);
        }
        let version = probe_version(&self.engine)?;
        let _ = self.version.set(version);
        Ok(version)
    }

    pub fn retry_plan(&self) -> RetryPlan {
        RetryPlan::from_config(&self.config.remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedEngine, ScriptedHookRunner, config, session};

    #[test]
    fn version_is_probed_once() {
        let engine = ScriptedEngine::new();
        engine.push_stdout("borgbackup 1.2.4\n");
        let session = Session::new(
            config(),
            engine,
            ScriptedHookRunner::default(),
            crate::test_support::RecordingSleeper::default(),
            false,
        );

        assert_eq!(session.version().expect("probe"), EngineVersion::new(1, 2, 4));
        assert_eq!(session.version().expect("cached"), EngineVersion::new(1, 2, 4));
        assert_eq!(session.engine.invocations().len(), 1);
    }

    #[test]
    fn seeded_version_skips_probe() {
        let session = session(config(), EngineVersion::new(1, 1, 17));
        assert_eq!(session.version().expect("seeded"), EngineVersion::new(1, 1, 17));
        assert!(session.engine.invocations().is_empty());
    }

    #[test]
    fn probe_failure_is_reported() {
        let engine = ScriptedEngine::new();
        engine.push_stdout("no version here\n");
        let session = Session::new(
            config(),
            engine,
            ScriptedHookRunner::default(),
            crate::test_support::RecordingSleeper::default(),
            false,
        );
        let err = session.version().unwrap_err();
        assert!(err.downcast_ref::<crate::error::VersionParseError>().is_some());
    }
}
