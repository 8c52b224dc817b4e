//! Manifest Validator - Checks pubspec.yaml against pub.dev listing rules
//!
//! Rules are checked in a fixed order and the first violation is returned,
//! so a manifest missing both name and version reports the name.
//!
//! # Example
//!
//! ```
//! use pub_publisher::manifest::Pubspec;
//! use pub_publisher::validation::{ManifestValidator, RuleViolation};
//!
//! let pubspec = Pubspec::from_yaml_str("version: 1.0.0\n").unwrap();
//! let result = ManifestValidator::new().validate(&pubspec);
//! assert_eq!(result, Err(RuleViolation::NameMissing));
//! ```

use crate::manifest::pubspec::{FLUTTER_DEPENDENCY, Pubspec};
use thiserror::Error;

/// Minimum description length accepted by pub.dev
pub const MIN_DESCRIPTION_LENGTH: usize = 60;

/// Maximum description length accepted by pub.dev
pub const MAX_DESCRIPTION_LENGTH: usize = 180;

/// A violated pub.dev listing rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("package name is required")]
    NameMissing,

    #[error("version is required")]
    VersionMissing,

    #[error("description is required for pub.dev")]
    DescriptionMissing,

    #[error("description too short: should be at least {min} characters (currently {actual})")]
    DescriptionTooShort { actual: usize, min: usize },

    #[error("description too long: should be at most {max} characters (currently {actual})")]
    DescriptionTooLong { actual: usize, max: usize },

    #[error("environment section is required")]
    EnvironmentMissing,

    #[error("SDK constraint is required in environment section")]
    SdkConstraintMissing,
}

/// Validator for pubspec.yaml business rules
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestValidator;

impl ManifestValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a parsed pubspec, short-circuiting at the first violation
    pub fn validate(&self, pubspec: &Pubspec) -> Result<(), RuleViolation> {
        if pubspec.name.is_empty() {
            return Err(RuleViolation::NameMissing);
        }

        if pubspec.version.is_empty() {
            return Err(RuleViolation::VersionMissing);
        }

        if pubspec.description.is_empty() {
            return Err(RuleViolation::DescriptionMissing);
        }

        let actual = pubspec.description.chars().count();
        if actual < MIN_DESCRIPTION_LENGTH {
            return Err(RuleViolation::DescriptionTooShort {
                actual,
                min: MIN_DESCRIPTION_LENGTH,
            });
        }
        if actual > MAX_DESCRIPTION_LENGTH {
            return Err(RuleViolation::DescriptionTooLong {
                actual,
                max: MAX_DESCRIPTION_LENGTH,
            });
        }

        let Some(environment) = &pubspec.environment else {
            return Err(RuleViolation::EnvironmentMissing);
        };

        match environment.get("sdk") {
            Some(sdk) if !sdk.is_empty() => Ok(()),
            _ => Err(RuleViolation::SdkConstraintMissing),
        }
    }

    /// Check whether the package depends on or configures Flutter
    ///
    /// Only used to pick the test runner; not part of validation.
    pub fn is_framework_package(pubspec: &Pubspec) -> bool {
        pubspec.has_dependency(FLUTTER_DEPENDENCY) || pubspec.has_flutter_section()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn description_of(len: usize) -> String {
        "a".repeat(len)
    }

    fn valid_pubspec() -> Pubspec {
        let mut environment = BTreeMap::new();
        environment.insert("sdk".to_string(), ">=3.0.0 <4.0.0".to_string());

        Pubspec {
            name: "test_package".to_string(),
            version: "1.0.0".to_string(),
            description: description_of(90),
            environment: Some(environment),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_pubspec() {
        assert_eq!(ManifestValidator::new().validate(&valid_pubspec()), Ok(()));
    }

    #[test]
    fn test_name_reported_before_version() {
        let pubspec = Pubspec {
            name: String::new(),
            version: String::new(),
            ..valid_pubspec()
        };

        let err = ManifestValidator::new().validate(&pubspec).unwrap_err();
        assert_eq!(err, RuleViolation::NameMissing);
        assert!(err.to_string().contains("name is required"));
    }

    #[test]
    fn test_missing_version() {
        let pubspec = Pubspec {
            version: String::new(),
            ..valid_pubspec()
        };
        assert_eq!(
            ManifestValidator::new().validate(&pubspec),
            Err(RuleViolation::VersionMissing)
        );
    }

    #[test]
    fn test_missing_description() {
        let pubspec = Pubspec {
            description: String::new(),
            ..valid_pubspec()
        };
        assert_eq!(
            ManifestValidator::new().validate(&pubspec),
            Err(RuleViolation::DescriptionMissing)
        );
    }

    #[test]
    fn test_description_length_boundaries() {
        let validator = ManifestValidator::new();

        for len in [60, 180] {
            let pubspec = Pubspec {
                description: description_of(len),
                ..valid_pubspec()
            };
            assert_eq!(validator.validate(&pubspec), Ok(()), "length {len}");
        }

        let short = Pubspec {
            description: description_of(59),
            ..valid_pubspec()
        };
        let err = validator.validate(&short).unwrap_err();
        assert_eq!(err, RuleViolation::DescriptionTooShort { actual: 59, min: 60 });
        assert!(err.to_string().contains("(currently 59)"));
        assert!(err.to_string().contains("at least 60"));

        let long = Pubspec {
            description: description_of(181),
            ..valid_pubspec()
        };
        let err = validator.validate(&long).unwrap_err();
        assert_eq!(err, RuleViolation::DescriptionTooLong { actual: 181, max: 180 });
        assert!(err.to_string().contains("(currently 181)"));
    }

    #[test]
    fn test_description_counts_characters() {
        let pubspec = Pubspec {
            description: "é".repeat(60),
            ..valid_pubspec()
        };
        assert_eq!(ManifestValidator::new().validate(&pubspec), Ok(()));
    }

    #[test]
    fn test_missing_environment() {
        let pubspec = Pubspec {
            environment: None,
            ..valid_pubspec()
        };
        let err = ManifestValidator::new().validate(&pubspec).unwrap_err();
        assert_eq!(err.to_string(), "environment section is required");
    }

    #[test]
    fn test_missing_or_empty_sdk() {
        let mut empty_sdk = BTreeMap::new();
        empty_sdk.insert("sdk".to_string(), String::new());

        for environment in [BTreeMap::new(), empty_sdk] {
            let pubspec = Pubspec {
                environment: Some(environment),
                ..valid_pubspec()
            };
            assert_eq!(
                ManifestValidator::new().validate(&pubspec),
                Err(RuleViolation::SdkConstraintMissing)
            );
        }
    }

    #[test]
    fn test_framework_package_detection() {
        let mut deps = BTreeMap::new();
        deps.insert(
            "flutter".to_string(),
            serde_yaml::from_str("sdk: flutter").unwrap(),
        );
        let mut section = BTreeMap::new();
        section.insert("uses-material-design".to_string(), serde_yaml::Value::Bool(true));

        let plain = valid_pubspec();
        let with_dependency = Pubspec {
            dependencies: Some(deps.clone()),
            ..valid_pubspec()
        };
        let with_section = Pubspec {
            flutter: Some(section.clone()),
            ..valid_pubspec()
        };
        let with_both = Pubspec {
            dependencies: Some(deps),
            flutter: Some(section),
            ..valid_pubspec()
        };
        let with_empty_section = Pubspec {
            flutter: Some(BTreeMap::new()),
            ..valid_pubspec()
        };

        assert!(!ManifestValidator::is_framework_package(&plain));
        assert!(ManifestValidator::is_framework_package(&with_dependency));
        assert!(ManifestValidator::is_framework_package(&with_section));
        assert!(ManifestValidator::is_framework_package(&with_both));
        assert!(!ManifestValidator::is_framework_package(&with_empty_section));
    }

    #[test]
    fn test_other_dependencies_are_not_framework_markers() {
        let mut deps = BTreeMap::new();
        deps.insert("path".to_string(), serde_yaml::Value::String("^1.8.0".to_string()));
        let pubspec = Pubspec {
            dependencies: Some(deps),
            ..valid_pubspec()
        };
        assert!(!ManifestValidator::is_framework_package(&pubspec));
    }
}
