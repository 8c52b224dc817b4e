//! Core traits and types for the release host
//!
//! The host drives a plugin through three calls: describe yourself, check a
//! configuration, run a hook. Everything crossing that boundary is plain
//! serde data so the binary can print it as JSON.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Hooks
// ============================================================================

/// Lifecycle point at which the host invokes a plugin
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Hook {
    PreVersion,
    PostVersion,
    PrePublish,
    PostPublish,
    OnSuccess,
    OnError,
}

impl Hook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::PreVersion => "pre-version",
            Hook::PostVersion => "post-version",
            Hook::PrePublish => "pre-publish",
            Hook::PostPublish => "post-publish",
            Hook::OnSuccess => "on-success",
            Hook::OnError => "on-error",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validation error with field information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    #[serde(default = "default_error_severity")]
    pub severity: String, // Always "error"
}

fn default_error_severity() -> String {
    "error".to_string()
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: default_error_severity(),
        }
    }
}

/// Result of configuration validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidateResponse {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Release information supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseContext {
    /// Version being released
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub previous_version: String,
    #[serde(default)]
    pub tag_name: String,
}

/// One hook invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub hook: Hook,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub context: ReleaseContext,
    /// Host-level dry-run, combined with the configured flag
    #[serde(default)]
    pub dry_run: bool,
}

/// Outcome of a hook invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ExecuteResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error_code: None,
        }
    }

    pub fn failure(message: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_code: Some(error_code.into()),
        }
    }
}

/// Plugin self-description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub hooks: Vec<Hook>,
}

// ============================================================================
// Release Plugin Trait
// ============================================================================

/// Interface the release host drives
#[async_trait]
pub trait ReleasePlugin: Send + Sync {
    fn info(&self) -> PluginInfo;

    /// Check prerequisites and configuration
    ///
    /// Problems are collected into the response rather than returned as an
    /// error; `Err` is reserved for failures of the check itself.
    async fn validate(&self, config: &Map<String, Value>) -> anyhow::Result<ValidateResponse>;

    /// Run one hook
    ///
    /// Cancelling `cancel` terminates any subprocess the hook is waiting on.
    async fn execute(
        &self,
        request: ExecuteRequest,
        cancel: CancellationToken,
    ) -> anyhow::Result<ExecuteResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_error_creation() {
        let error = ValidationError::new("pubspec", "version is required");

        assert_eq!(error.field, "pubspec");
        assert_eq!(error.severity, "error");
    }

    #[test]
    fn test_validate_response_from_errors() {
        assert!(ValidateResponse::from_errors(vec![]).valid);

        let response =
            ValidateResponse::from_errors(vec![ValidationError::new("dart", "missing")]);
        assert!(!response.valid);
        assert_eq!(response.errors.len(), 1);
    }

    #[test]
    fn test_hook_serialization() {
        let json = serde_json::to_string(&Hook::PrePublish).unwrap();
        assert_eq!(json, r#""pre-publish""#);

        let hook: Hook = serde_json::from_str(r#""post-publish""#).unwrap();
        assert_eq!(hook, Hook::PostPublish);
        assert_eq!(Hook::OnError.to_string(), "on-error");
    }

    #[test]
    fn test_execute_request_defaults() {
        let request: ExecuteRequest =
            serde_json::from_value(json!({ "hook": "pre-publish" })).unwrap();

        assert_eq!(request.hook, Hook::PrePublish);
        assert!(request.config.is_empty());
        assert!(request.context.version.is_empty());
        assert!(!request.dry_run);
    }

    #[test]
    fn test_execute_response_serialization() {
        let ok = serde_json::to_string(&ExecuteResponse::success("done")).unwrap();
        assert!(!ok.contains("error_code"));

        let failed =
            serde_json::to_value(ExecuteResponse::failure("Analysis failed: x", "COMMAND_ERROR"))
                .unwrap();
        assert_eq!(failed["success"], json!(false));
        assert_eq!(failed["error_code"], json!("COMMAND_ERROR"));
    }
}
