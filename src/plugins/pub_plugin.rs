//! Pub Plugin - pub.dev publishing for the release host
//!
//! This module connects the host-facing [`ReleasePlugin`] interface to the
//! publishing workflow:
//! - Dart SDK presence check
//! - pubspec.yaml loading and pub.dev listing rules
//! - pre-publish and post-publish hook dispatch

use crate::core::config_loader::ConfigLoader;
use crate::core::traits::{
    ExecuteRequest, ExecuteResponse, Hook, PluginInfo, ReleasePlugin, ValidateResponse,
    ValidationError,
};
use crate::manifest::parse_pubspec;
use crate::orchestration::pipeline::PublishPipeline;
use crate::plugins::dart_cli::DartCli;
use crate::security::command_executor::CommandRunner;
use crate::validation::ManifestValidator;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Plugin name
pub const PLUGIN_NAME: &str = "pub";

const PLUGIN_DESCRIPTION: &str = "Publish Dart and Flutter packages to pub.dev";

/// pub.dev release plugin
pub struct PubPlugin {
    runner: Arc<dyn CommandRunner>,
    workdir: PathBuf,
    env: HashMap<String, String>,
}

impl PubPlugin {
    /// Create a plugin reading environment fallbacks from the process environment
    pub fn new(runner: Arc<dyn CommandRunner>, workdir: impl Into<PathBuf>) -> Self {
        Self::with_env(runner, workdir, env::vars().collect())
    }

    /// Create a plugin with an explicit environment for configuration fallbacks
    pub fn with_env(
        runner: Arc<dyn CommandRunner>,
        workdir: impl Into<PathBuf>,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
            env,
        }
    }
}

#[async_trait]
impl ReleasePlugin for PubPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: PLUGIN_DESCRIPTION.to_string(),
            hooks: vec![Hook::PrePublish, Hook::PostPublish],
        }
    }

    async fn validate(&self, config: &Map<String, Value>) -> anyhow::Result<ValidateResponse> {
        let cfg = ConfigLoader::parse_with_env(config, self.env.clone());
        let mut errors = Vec::new();

        let dart = DartCli::new(self.runner.clone());
        match dart.sdk_version(&CancellationToken::new()).await {
            Ok(version) => debug!(%version, "Found Dart SDK"),
            Err(e) => {
                debug!(error = %e, "Dart SDK check failed");
                errors.push(ValidationError::new("dart", "Dart SDK not found in PATH"));
            }
        }

        match parse_pubspec(self.workdir.join(&cfg.pubspec_path)).await {
            Ok(pubspec) => {
                if cfg.validate
                    && let Err(violation) = ManifestValidator::new().validate(&pubspec)
                {
                    errors.push(ValidationError::new("pubspec", violation.to_string()));
                }
            }
            Err(e) => errors.push(ValidationError::new(
                "pubspec_path",
                format!("Invalid pubspec.yaml: {}", e),
            )),
        }

        Ok(ValidateResponse::from_errors(errors))
    }

    async fn execute(
        &self,
        request: ExecuteRequest,
        cancel: CancellationToken,
    ) -> anyhow::Result<ExecuteResponse> {
        let mut cfg = ConfigLoader::parse_with_env(&request.config, self.env.clone());
        cfg.dry_run = cfg.dry_run || request.dry_run;

        info!(hook = %request.hook, dry_run = cfg.dry_run, "Executing hook");

        let pipeline = PublishPipeline::new(cfg, self.workdir.clone(), self.runner.clone(), cancel);
        let outcome = match request.hook {
            Hook::PrePublish => pipeline.pre_publish(&request.context).await,
            Hook::PostPublish => pipeline.post_publish(&request.context).await,
            other => {
                return Ok(ExecuteResponse::success(format!(
                    "Hook {} not handled by pub plugin",
                    other
                )));
            }
        };

        Ok(outcome.into())
    }
}
