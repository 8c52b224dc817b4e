//! pubspec.yaml model and loader
//!
//! Only the fields the publishing workflow cares about are modelled. Anything
//! else in the file is ignored on read and never touched on write (see
//! [`update_version`](super::version_editor::update_version)).

use crate::core::error::PluginError;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// Default manifest file name
pub const PUBSPEC_FILE: &str = "pubspec.yaml";

/// Dependency key that marks a Flutter package
pub const FLUTTER_DEPENDENCY: &str = "flutter";

/// Parsed pubspec.yaml
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Pubspec {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub homepage: Option<String>,

    #[serde(default)]
    pub repository: Option<String>,

    /// SDK constraints; `None` when the section is absent
    #[serde(default, deserialize_with = "scalar_map")]
    pub environment: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub dependencies: Option<BTreeMap<String, serde_yaml::Value>>,

    #[serde(default)]
    pub dev_dependencies: Option<BTreeMap<String, serde_yaml::Value>>,

    /// Flutter-specific section (`flutter:`)
    #[serde(default)]
    pub flutter: Option<BTreeMap<String, serde_yaml::Value>>,
}

impl Pubspec {
    /// Parse pubspec content from a YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// SDK constraint from the environment section, if any
    pub fn sdk_constraint(&self) -> Option<&str> {
        self.environment
            .as_ref()
            .and_then(|env| env.get("sdk"))
            .map(String::as_str)
    }

    /// Check whether a runtime dependency is declared
    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies
            .as_ref()
            .is_some_and(|deps| deps.contains_key(name))
    }

    /// Check whether the `flutter:` section has any entries
    pub fn has_flutter_section(&self) -> bool {
        self.flutter.as_ref().is_some_and(|section| !section.is_empty())
    }
}

/// Load and parse a pubspec.yaml file
///
/// Fails with [`PluginError::ManifestNotFound`] when the file cannot be read
/// and [`PluginError::ManifestParse`] when it is not well-formed YAML.
pub async fn parse_pubspec(path: impl AsRef<Path>) -> Result<Pubspec, PluginError> {
    let path = path.as_ref();

    let content = fs::read_to_string(path)
        .await
        .map_err(|source| PluginError::ManifestNotFound {
            path: path.to_path_buf(),
            source,
        })?;

    Pubspec::from_yaml_str(&content).map_err(|source| PluginError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Deserialize a mapping whose scalar values are kept as their string form
fn scalar_map<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_yaml::Value>> = Option::deserialize(deserializer)?;

    Ok(raw.map(|entries| {
        entries
            .into_iter()
            .map(|(key, value)| (key, scalar_to_string(value)))
            .collect()
    }))
}

fn scalar_to_string(value: serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s,
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
