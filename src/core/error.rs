//! Error handling for pub publishing
//!
//! This module provides the error type shared by the manifest, credential and
//! pipeline layers, using the thiserror crate for ergonomic error handling.

use crate::security::command_executor::CommandError;
use crate::validation::manifest_validator::RuleViolation;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pub publishing operations
#[derive(Error, Debug)]
pub enum PluginError {
    // Manifest errors
    #[error("failed to read {}: {source}", path.display())]
    ManifestNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("version field not found in {}", path.display())]
    VersionFieldNotFound { path: PathBuf },

    #[error("failed to write {}: {source}", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Validation errors
    #[error(transparent)]
    Validation(#[from] RuleViolation),

    // Credential errors
    #[error("failed to read credentials from {}: {source}", path.display())]
    CredentialsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse credentials in {}: {source}", path.display())]
    CredentialsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to get home directory")]
    HomeDirUnavailable,

    // Release context errors
    #[error("no release version supplied by the release context")]
    MissingReleaseVersion,

    // Command execution errors
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl PluginError {
    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ManifestNotFound { .. } => "MANIFEST_NOT_FOUND",
            Self::ManifestParse { .. } => "MANIFEST_PARSE_ERROR",
            Self::VersionFieldNotFound { .. } => "VERSION_FIELD_NOT_FOUND",
            Self::ManifestWrite { .. } => "MANIFEST_WRITE_ERROR",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::CredentialsRead { .. } => "CREDENTIALS_NOT_FOUND",
            Self::CredentialsParse { .. } => "CREDENTIALS_PARSE_ERROR",
            Self::HomeDirUnavailable => "HOME_DIR_UNAVAILABLE",
            Self::MissingReleaseVersion => "MISSING_RELEASE_VERSION",
            Self::Command(CommandError::Cancelled) => "CANCELLED",
            Self::Command(CommandError::Timeout(_)) => "TIMEOUT",
            Self::Command(_) => "COMMAND_ERROR",
        }
    }

    /// Check if the failure was caused by a caller-initiated abort
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Command(CommandError::Cancelled))
    }
}
