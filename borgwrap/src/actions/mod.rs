//! Top-level operations behind each CLI subcommand.
//!
//! Actions take a [`Session`](crate::session::Session) and return typed failures;
//! choosing the process exit code is left to `main`.

pub mod check_age;
pub mod create;
pub mod list;
pub mod passthrough;
pub mod prune;
