//! Typed configuration model.
//!
//! The parsed document is validated against the embedded JSON Schema and converted once
//! into [`Config`]. Every optional key receives its default here, so callers read plain
//! fields instead of probing the document for key presence.

use std::fmt;

use jsonschema::Draft;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ConfigError;

const CONFIG_SCHEMA: &str = include_str!("../../schemas/config.schema.json");

/// Fully resolved wrapper configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub location: LocationConfig,
    pub remote: RemoteConfig,
    #[serde(default, deserialize_with = "null_as_default")]
    pub retention: RetentionConfig,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hooks: HooksConfig,
}

/// What to back up and what to leave out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationConfig {
    /// Source paths, in configured order. A single string is accepted as one path.
    #[serde(deserialize_with = "one_or_many")]
    pub source: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude: Vec<String>,
    /// Marker filenames whose presence excludes the containing directory.
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude_if_present: Vec<String>,
    #[serde(default, deserialize_with = "boolean_like")]
    pub exclude_caches: bool,
    #[serde(default, deserialize_with = "boolean_like")]
    pub keep_exclude_tags: bool,
    #[serde(default, deserialize_with = "boolean_like")]
    pub one_file_system: bool,
    #[serde(default, deserialize_with = "boolean_like")]
    pub noatime: bool,
}

/// Where archives go and how the engine talks to the repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteConfig {
    pub repository: String,
    /// Archive name prefix. Without one, archives are named by timestamp only and
    /// list/prune do not restrict the archive set.
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub compression: Option<String>,
    /// Upload rate limit in KiB/s.
    #[serde(default)]
    pub ratelimit: Option<u64>,
    /// Remote shell command exported to the engine as `BORG_RSH`.
    #[serde(default)]
    pub rsh: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub retries: u32,
    /// Minutes to wait between attempts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub retry_wait: u64,
}

/// Retention rules; an absent rule is not passed to the engine at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RetentionConfig {
    pub keep_last: Option<RetentionValue>,
    pub keep_within: Option<RetentionValue>,
    pub keep_hourly: Option<RetentionValue>,
    pub keep_daily: Option<RetentionValue>,
    pub keep_weekly: Option<RetentionValue>,
    pub keep_monthly: Option<RetentionValue>,
    pub keep_yearly: Option<RetentionValue>,
}

impl RetentionConfig {
    /// Configured rules as `(flag, value)` pairs in the engine's priority order.
    pub fn rules(&self) -> Vec<(&'static str, &RetentionValue)> {
        [
            ("--keep-last", &self.keep_last),
            ("--keep-within", &self.keep_within),
            ("--keep-hourly", &self.keep_hourly),
            ("--keep-daily", &self.keep_daily),
            ("--keep-weekly", &self.keep_weekly),
            ("--keep-monthly", &self.keep_monthly),
            ("--keep-yearly", &self.keep_yearly),
        ]
        .into_iter()
        .filter_map(|(flag, value)| value.as_ref().map(|value| (flag, value)))
        .collect()
    }
}

/// A retention value exactly as written in the config (`7`, `"2d"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RetentionValue {
    Count(i64),
    Text(String),
}

impl fmt::Display for RetentionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionValue::Count(count) => write!(f, "{count}"),
            RetentionValue::Text(text) => f.write_str(text),
        }
    }
}

/// Shell commands run around `create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HooksConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub before: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub after: Vec<String>,
}

impl Config {
    /// Validate a parsed document and convert it into a typed config.
    pub fn from_document(document: &Value) -> Result<Self, ConfigError> {
        if !document.is_object() {
            return Err(ConfigError::NotAMapping);
        }
        validate_schema(document)?;
        let config =
            Config::deserialize(document).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.repository.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "remote.repository must not be empty".to_string(),
            ));
        }
        if self.location.source.is_empty() {
            return Err(ConfigError::Invalid(
                "location.source must name at least one path".to_string(),
            ));
        }
        Ok(())
    }
}

/// Interpret a loosely typed config value as a boolean.
///
/// True for boolean `true`, the strings "yes"/"true" in any case, and the integer 1.
pub fn coerce_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => {
            text.eq_ignore_ascii_case("yes") || text.eq_ignore_ascii_case("true")
        }
        Value::Number(number) => number.as_i64() == Some(1),
        _ => false,
    }
}

fn validate_schema(document: &Value) -> Result<(), ConfigError> {
    let schema: Value = serde_json::from_str(CONFIG_SCHEMA)
        .map_err(|err| ConfigError::Invalid(format!("parse config schema: {err}")))?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|err| ConfigError::Invalid(format!("compile config schema: {err}")))?;
    let messages: Vec<String> = compiled
        .iter_errors(document)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        return Err(ConfigError::Schema(messages));
    }
    Ok(())
}

fn boolean_like<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_boolean(&value))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(path) => vec![path],
        OneOrMany::Many(paths) => paths,
    })
}
