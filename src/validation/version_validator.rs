//! Release version checks
//!
//! pub.dev versions are SemVer 2.0.0 with an optional `+build` suffix, which
//! the `semver` crate parses as build metadata. These checks only feed
//! warnings; the pipeline never refuses a release version on these grounds.

use semver::Version;
use std::cmp::Ordering;

/// Result of release version validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
    /// Build suffix after `+` (Flutter build number)
    pub build: Option<String>,
}

/// Validator for release version strings
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionValidator;

impl VersionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a version string
    ///
    /// # Examples
    ///
    /// ```
    /// use pub_publisher::validation::VersionValidator;
    ///
    /// let validator = VersionValidator::new();
    /// assert!(validator.validate("1.0.0+1").is_valid);
    /// assert!(!validator.validate("1.0").is_valid);
    /// ```
    pub fn validate(&self, version_str: &str) -> VersionValidationResult {
        match Version::parse(version_str) {
            Ok(version) => VersionValidationResult {
                is_valid: true,
                error: None,
                build: if version.build.is_empty() {
                    None
                } else {
                    Some(version.build.to_string())
                },
            },
            Err(e) => VersionValidationResult {
                is_valid: false,
                error: Some(e.to_string()),
                build: None,
            },
        }
    }

    /// Compare two versions, `None` if either is invalid
    pub fn compare(&self, v1: &str, v2: &str) -> Option<Ordering> {
        let version1 = Version::parse(v1).ok()?;
        let version2 = Version::parse(v2).ok()?;
        Some(version1.cmp(&version2))
    }

    /// Check whether `target` would move the package backwards from `current`
    pub fn is_downgrade(&self, current: &str, target: &str) -> bool {
        self.compare(target, current) == Some(Ordering::Less)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_version() {
        let result = VersionValidator::new().validate("1.2.3");
        assert!(result.is_valid);
        assert!(result.error.is_none());
        assert!(result.build.is_none());
    }

    #[test]
    fn test_validate_flutter_build_number() {
        let result = VersionValidator::new().validate("2.0.0+5");
        assert!(result.is_valid);
        assert_eq!(result.build, Some("5".to_string()));
    }

    #[test]
    fn test_validate_invalid_version() {
        let result = VersionValidator::new().validate("v1");
        assert!(!result.is_valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_compare() {
        let validator = VersionValidator::new();
        assert_eq!(validator.compare("1.0.0", "2.0.0"), Some(Ordering::Less));
        assert_eq!(validator.compare("1.0.0", "1.0.0"), Some(Ordering::Equal));
        assert_eq!(validator.compare("invalid", "1.0.0"), None);
    }

    #[test]
    fn test_is_downgrade() {
        let validator = VersionValidator::new();
        assert!(validator.is_downgrade("2.0.0", "1.9.9"));
        assert!(!validator.is_downgrade("1.0.0", "2.0.0"));
        assert!(!validator.is_downgrade("1.0.0", "1.0.0"));
        assert!(!validator.is_downgrade("garbage", "1.0.0"));
    }
}
