//! Dart and Flutter SDK commands
//!
//! Each abstract operation of the publishing workflow maps to one fixed
//! argument list. The argument builders are pure so the exact command lines
//! can be checked without spawning anything.

use crate::core::config::TestConfig;
use crate::core::error::PluginError;
use crate::security::command_executor::{CommandOutput, CommandRunner, Invocation};
use crate::security::credentials::PubCredentials;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const DART: &str = "dart";
const FLUTTER: &str = "flutter";

/// Environment variable carrying the registry token
pub const PUB_TOKEN_ENV: &str = "PUB_TOKEN";

/// Environment variable carrying a custom registry URL
pub const PUB_HOSTED_URL_ENV: &str = "PUB_HOSTED_URL";

/// Typed front end for the Dart SDK tools
#[derive(Clone)]
pub struct DartCli {
    runner: Arc<dyn CommandRunner>,
}

impl DartCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// `dart analyze --fatal-infos --fatal-warnings`
    pub fn analyze_args() -> Vec<String> {
        to_args(&["analyze", "--fatal-infos", "--fatal-warnings"])
    }

    /// `dart format --set-exit-if-changed .`
    pub fn format_check_args() -> Vec<String> {
        to_args(&["format", "--set-exit-if-changed", "."])
    }

    /// `dart test` with the optional platform, concurrency and coverage flags
    pub fn test_args(config: &TestConfig) -> Vec<String> {
        let mut args = vec!["test".to_string()];

        if !config.platform.is_empty() {
            args.push("--platform".to_string());
            args.push(config.platform.clone());
        }
        if config.concurrency > 0 {
            args.push("--concurrency".to_string());
            args.push(config.concurrency.to_string());
        }
        if config.coverage {
            args.push("--coverage".to_string());
        }

        args
    }

    /// `dart pub publish --dry-run`
    pub fn publish_dry_run_args() -> Vec<String> {
        to_args(&["pub", "publish", "--dry-run"])
    }

    /// `dart pub publish [--force]`
    pub fn publish_args(force: bool) -> Vec<String> {
        let mut args = to_args(&["pub", "publish"]);
        if force {
            args.push("--force".to_string());
        }
        args
    }

    pub async fn analyze(&self, cancel: &CancellationToken) -> Result<(), PluginError> {
        self.run(Invocation::new(DART, Self::analyze_args()), cancel)
            .await
            .map(drop)
    }

    pub async fn format_check(&self, cancel: &CancellationToken) -> Result<(), PluginError> {
        self.run(Invocation::new(DART, Self::format_check_args()), cancel)
            .await
            .map(drop)
    }

    pub async fn test(
        &self,
        config: &TestConfig,
        cancel: &CancellationToken,
    ) -> Result<(), PluginError> {
        self.run(Invocation::new(DART, Self::test_args(config)), cancel)
            .await
            .map(drop)
    }

    /// `flutter test`
    pub async fn flutter_test(&self, cancel: &CancellationToken) -> Result<(), PluginError> {
        self.run(Invocation::new(FLUTTER, ["test"]), cancel)
            .await
            .map(drop)
    }

    pub async fn publish_dry_run(&self, cancel: &CancellationToken) -> Result<(), PluginError> {
        self.run(Invocation::new(DART, Self::publish_dry_run_args()), cancel)
            .await
            .map(drop)
    }

    /// Publish to the registry
    ///
    /// The token travels as `PUB_TOKEN` and a non-empty `hosted_url` as
    /// `PUB_HOSTED_URL`.
    pub async fn publish(
        &self,
        force: bool,
        credentials: Option<&PubCredentials>,
        hosted_url: &str,
        cancel: &CancellationToken,
    ) -> Result<(), PluginError> {
        let mut invocation = Invocation::new(DART, Self::publish_args(force));

        if let Some(creds) = credentials.filter(|c| !c.access_token.is_empty()) {
            debug!(token = %creds.masked_token(), "Passing registry token");
            invocation = invocation.secret_env(PUB_TOKEN_ENV, creds.secret_token());
        }
        if !hosted_url.is_empty() {
            invocation = invocation.env(PUB_HOSTED_URL_ENV, hosted_url);
        }

        self.run(invocation, cancel).await.map(drop)
    }

    /// `dart --version`, returning the reported version line
    pub async fn sdk_version(&self, cancel: &CancellationToken) -> Result<String, PluginError> {
        let output = self.run(Invocation::new(DART, ["--version"]), cancel).await?;

        // Older SDKs print the banner on stderr
        let banner = if output.stdout.trim().is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        Ok(banner.trim().to_string())
    }

    async fn run(
        &self,
        invocation: Invocation,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, PluginError> {
        debug!(command = %invocation, "Running SDK command");
        Ok(self.runner.run(&invocation, cancel).await?)
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
