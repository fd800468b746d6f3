//! Configuration-driven front end for the BorgBackup engine.
//!
//! A declarative config is turned into engine invocations with retries, hooks and
//! version-dependent flags. The crate is split the usual way:
//!
//! - **[`core`]**: Pure logic (config model, version gating, argument lists, check
//!   evaluation, table rendering). No I/O.
//! - **[`io`]**: Side effects (config files, child processes, hooks, temp files),
//!   behind traits so actions can be tested with fakes.
//!
//! [`actions`] combine the two through a [`session::Session`] to implement the CLI
//! subcommands.

pub mod actions;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod retry;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
