//! Configuration structures and types for the pub plugin
//!
//! [`PluginConfig::default`] is the one place the defaulting policy lives;
//! the loader starts from it and overrides whatever the host supplied.

use serde::{Deserialize, Serialize};

/// Default manifest location, relative to the working directory
pub const DEFAULT_PUBSPEC_PATH: &str = "pubspec.yaml";

/// Default `dart test --platform`
pub const DEFAULT_TEST_PLATFORM: &str = "vm";

/// Default `dart test --concurrency`
pub const DEFAULT_TEST_CONCURRENCY: u32 = 4;

/// Plugin configuration for one hook invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Path to pubspec.yaml
    pub pubspec_path: String,

    /// Rewrite the pubspec version to the release version
    pub update_version: bool,

    /// Credentials file; empty means `~/.pub-cache/credentials.json`
    pub credentials_path: String,

    /// Access token taking precedence over the credentials file
    #[serde(skip_serializing, default)]
    pub access_token: String,

    /// Custom registry URL; empty means pub.dev
    pub hosted_url: String,

    /// Check pub.dev listing rules during validation
    pub validate: bool,

    /// Run `dart analyze`
    pub analyze: bool,

    /// Run `dart format --set-exit-if-changed`
    pub format_check: bool,

    /// Run the test suite
    pub test: bool,

    pub test_config: TestConfig,

    /// Run `dart pub publish --dry-run` before releasing
    pub dry_run_validate: bool,

    /// Publish without the interactive confirmation
    pub force: bool,

    /// Paths excluded from publishing
    pub exclude: Vec<String>,

    /// Simulate side-effecting steps
    pub dry_run: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            pubspec_path: DEFAULT_PUBSPEC_PATH.to_string(),
            update_version: true,
            credentials_path: String::new(),
            access_token: String::new(),
            hosted_url: String::new(),
            validate: true,
            analyze: true,
            format_check: true,
            test: true,
            test_config: TestConfig::default(),
            dry_run_validate: true,
            force: true,
            exclude: Vec::new(),
            dry_run: false,
        }
    }
}

/// Test execution options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfig {
    /// Empty omits `--platform`
    pub platform: String,
    /// Zero omits `--concurrency`
    pub concurrency: u32,
    pub coverage: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            platform: DEFAULT_TEST_PLATFORM.to_string(),
            concurrency: DEFAULT_TEST_CONCURRENCY,
            coverage: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PluginConfig::default();

        assert_eq!(config.pubspec_path, "pubspec.yaml");
        assert!(config.update_version);
        assert!(config.validate);
        assert!(config.analyze);
        assert!(config.format_check);
        assert!(config.test);
        assert!(config.dry_run_validate);
        assert!(config.force);
        assert!(!config.dry_run);
        assert!(config.credentials_path.is_empty());
        assert!(config.access_token.is_empty());
        assert!(config.hosted_url.is_empty());
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn test_default_test_config() {
        let config = TestConfig::default();

        assert_eq!(config.platform, "vm");
        assert_eq!(config.concurrency, 4);
        assert!(!config.coverage);
    }

    #[test]
    fn test_serialization_omits_access_token() {
        let config = PluginConfig {
            access_token: "super-secret-token".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret-token"));
        assert!(json.contains("\"pubspec_path\":\"pubspec.yaml\""));
    }
}
