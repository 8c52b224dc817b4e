pub mod manifest_validator;
pub mod version_validator;

pub use manifest_validator::{
    MAX_DESCRIPTION_LENGTH, MIN_DESCRIPTION_LENGTH, ManifestValidator, RuleViolation,
};
pub use version_validator::{VersionValidationResult, VersionValidator};
