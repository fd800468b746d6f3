//! Deterministic logic: configuration model, version gating, argument building and
//! report rendering.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory data and
//! return deterministic outputs suitable for tests.

pub mod check_age;
pub mod command;
pub mod config;
pub mod format;
pub mod types;
pub mod version;
