//! I/O helpers: config files, engine processes, hooks and temporary files.

pub mod config;
pub mod engine;
pub mod exclude;
pub mod hooks;
pub mod process;
