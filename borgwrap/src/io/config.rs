//! Config file loading.
//!
//! YAML is the default format; files ending in `.toml` are read as TOML. Either way the
//! file is parsed into a generic document first and then handed to
//! [`Config::from_document`] for validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::core::config::Config;

/// On-disk config format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Read, parse and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let format = ConfigFormat::for_path(path);
    debug!(path = %path.display(), ?format, "loading config");
    let document =
        parse_document(&contents, format).with_context(|| format!("parse {}", path.display()))?;
    let config =
        Config::from_document(&document).with_context(|| format!("load {}", path.display()))?;
    Ok(config)
}

/// Parse config text into a generic document.
pub fn parse_document(contents: &str, format: ConfigFormat) -> Result<Value> {
    let document = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(contents).context("parse yaml")?,
        ConfigFormat::Toml => toml::from_str(contents).context("parse toml")?,
    };
    Ok(document)
}
