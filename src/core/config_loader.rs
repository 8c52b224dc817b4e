//! Configuration loader for the pub plugin
//!
//! The host hands over an untyped key-value map. Decoding is lenient: a key
//! that is missing or carries the wrong type keeps its default. String keys
//! may fall back to an environment variable and may reference variables as
//! `${VAR_NAME}`.

use super::config::{PluginConfig, TestConfig};
use anyhow::Context;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;
use tracing::warn;

/// Environment fallback for `access_token`
pub const ACCESS_TOKEN_ENV: &str = "PUB_ACCESS_TOKEN";

/// Environment fallback for `hosted_url`
pub const HOSTED_URL_ENV: &str = "PUB_HOSTED_URL";

lazy_static! {
    /// Environment variable reference (${VAR_NAME})
    static ref ENV_VAR_PATTERN: Regex =
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid");
}

/// Typed accessors over a raw configuration map
pub struct ConfigParser<'a> {
    raw: &'a Map<String, Value>,
    env: HashMap<String, String>,
}

impl<'a> ConfigParser<'a> {
    /// Parser reading fallbacks from an explicit environment
    pub fn with_env(raw: &'a Map<String, Value>, env: HashMap<String, String>) -> Self {
        Self { raw, env }
    }

    /// String value, then the `env_var` fallback, then `default`
    ///
    /// Empty strings count as unset.
    pub fn get_string(&self, key: &str, env_var: Option<&str>, default: &str) -> String {
        if let Some(value) = self.raw.get(key).and_then(Value::as_str)
            && !value.is_empty()
        {
            return self.expand(value);
        }

        env_var
            .and_then(|name| self.env.get(name))
            .filter(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.raw.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// String entries of a sequence; other entries are skipped
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.raw
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| self.expand(s))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_test_config(&self, key: &str) -> TestConfig {
        let mut config = TestConfig::default();

        let Some(raw) = self.raw.get(key).and_then(Value::as_object) else {
            return config;
        };

        if let Some(platform) = raw.get("platform").and_then(Value::as_str) {
            config.platform = platform.to_string();
        }
        if let Some(concurrency) = raw.get("concurrency").and_then(as_count) {
            config.concurrency = concurrency;
        }
        if let Some(coverage) = raw.get("coverage").and_then(Value::as_bool) {
            config.coverage = coverage;
        }

        config
    }

    /// Replace `${VAR}` references; unknown variables are left in place
    fn expand(&self, input: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(input, |caps: &Captures| {
                let name = &caps[1];
                match self.env.get(name) {
                    Some(value) => value.clone(),
                    None => {
                        warn!(variable = name, "Environment variable not found");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}

/// Non-negative count from an integer or floating JSON number
fn as_count(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return Some(u32::try_from(n).unwrap_or(u32::MAX));
    }
    value.as_f64().map(|f| f.max(0.0) as u32)
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Decode a raw configuration map using an explicit environment
    pub fn parse_with_env(raw: &Map<String, Value>, env: HashMap<String, String>) -> PluginConfig {
        Self::from_parser(&ConfigParser::with_env(raw, env))
    }

    fn from_parser(parser: &ConfigParser<'_>) -> PluginConfig {
        let defaults = PluginConfig::default();

        PluginConfig {
            pubspec_path: parser.get_string("pubspec_path", None, &defaults.pubspec_path),
            update_version: parser.get_bool("update_version", defaults.update_version),
            credentials_path: parser.get_string(
                "credentials_path",
                None,
                &defaults.credentials_path,
            ),
            access_token: parser.get_string(
                "access_token",
                Some(ACCESS_TOKEN_ENV),
                &defaults.access_token,
            ),
            hosted_url: parser.get_string("hosted_url", Some(HOSTED_URL_ENV), &defaults.hosted_url),
            validate: parser.get_bool("validate", defaults.validate),
            analyze: parser.get_bool("analyze", defaults.analyze),
            format_check: parser.get_bool("format_check", defaults.format_check),
            test: parser.get_bool("test", defaults.test),
            test_config: parser.get_test_config("test_config"),
            dry_run_validate: parser.get_bool("dry_run_validate", defaults.dry_run_validate),
            force: parser.get_bool("force", defaults.force),
            exclude: parser.get_string_list("exclude"),
            dry_run: parser.get_bool("dry_run", defaults.dry_run),
        }
    }

    /// Read a YAML or JSON configuration file into a raw map
    ///
    /// An empty file yields an empty map.
    pub async fn load_file(path: &Path) -> anyhow::Result<Map<String, Value>> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => anyhow::bail!(
                "Config file {} must contain a mapping, found {}",
                path.display(),
                other
            ),
        }
    }
}
