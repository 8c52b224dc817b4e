//! PublishPipeline - staged execution of the pre-publish and post-publish hooks
//!
//! Each hook is a fixed, linear list of gated steps. Before a step touches
//! anything its mode is decided from `(enabled, dry_run)`:
//!
//! - **Skip**: the step is disabled and not attempted at all
//! - **Simulate**: dry-run; the step is described in the log and counts as passed
//! - **Execute**: the real side effect runs and its outcome gates continuation
//!
//! The first failing step ends the run. Earlier mutations (the version bump)
//! stay in place.

use crate::core::config::PluginConfig;
use crate::core::error::PluginError;
use crate::core::state_machine::{PipelineState, PipelineStateMachine};
use crate::core::traits::{ExecuteResponse, Hook, ReleaseContext};
use crate::manifest::{Pubspec, parse_pubspec, update_version};
use crate::plugins::dart_cli::DartCli;
use crate::security::command_executor::CommandRunner;
use crate::security::credentials::{CredentialStore, PubCredentials};
use crate::validation::{ManifestValidator, VersionValidator};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// Registry name reported when no hosted URL is configured
pub const DEFAULT_REGISTRY: &str = "pub.dev";

/// Pre-publish success message
pub const PRE_PUBLISH_SUCCESS: &str = "Package validated successfully";

/// How a gated step is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    Skip,
    Simulate,
    Execute,
}

impl StepMode {
    pub fn decide(enabled: bool, dry_run: bool) -> Self {
        match (enabled, dry_run) {
            (false, _) => StepMode::Skip,
            (true, true) => StepMode::Simulate,
            (true, false) => StepMode::Execute,
        }
    }
}

/// Pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    LoadManifest,
    UpdateVersion,
    Analyze,
    FormatCheck,
    FlutterTest,
    Test,
    PublishDryRun,
    Publish,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::LoadManifest => "Manifest load",
            Step::UpdateVersion => "Version update",
            Step::Analyze => "Analysis",
            Step::FormatCheck => "Format check",
            Step::FlutterTest => "Flutter tests",
            Step::Test => "Tests",
            Step::PublishDryRun => "Dry-run validation",
            Step::Publish => "Publish",
        }
    }

    fn state(&self) -> PipelineState {
        match self {
            Step::LoadManifest => PipelineState::LoadingManifest,
            Step::UpdateVersion => PipelineState::UpdatingVersion,
            Step::Analyze => PipelineState::Analyzing,
            Step::FormatCheck => PipelineState::CheckingFormat,
            Step::FlutterTest | Step::Test => PipelineState::Testing,
            Step::PublishDryRun => PipelineState::ValidatingPublish,
            Step::Publish => PipelineState::Publishing,
        }
    }

    fn failed(self) -> impl FnOnce(PluginError) -> StepFailure {
        move |cause| StepFailure { step: self, cause }
    }
}

/// A step that ended the run
#[derive(Debug)]
pub struct StepFailure {
    pub step: Step,
    pub cause: PluginError,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Step::LoadManifest => write!(f, "Failed to load pubspec.yaml: {}", self.cause),
            Step::UpdateVersion => write!(f, "Failed to update version: {}", self.cause),
            step => write!(f, "{} failed: {}", step.label(), self.cause),
        }
    }
}

impl std::error::Error for StepFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Result of one hook run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub success: bool,
    pub message: String,
    pub state: PipelineState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Steps that were only described
    pub simulated: Vec<Step>,
    pub history: Vec<String>,
    pub elapsed_ms: i64,
}

impl From<PipelineOutcome> for ExecuteResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        match (outcome.success, outcome.error_code) {
            (true, _) => ExecuteResponse::success(outcome.message),
            (false, Some(code)) => ExecuteResponse::failure(outcome.message, code),
            (false, None) => ExecuteResponse {
                success: false,
                message: outcome.message,
                error_code: None,
            },
        }
    }
}

/// Single-shot runner for one hook invocation
pub struct PublishPipeline {
    config: PluginConfig,
    workdir: PathBuf,
    dart: DartCli,
    cancel: CancellationToken,
    state_machine: PipelineStateMachine,
    simulated: Vec<Step>,
}

impl PublishPipeline {
    /// Create a pipeline
    ///
    /// Relative manifest and credential paths resolve against `workdir`.
    pub fn new(
        config: PluginConfig,
        workdir: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            workdir: workdir.into(),
            dart: DartCli::new(runner),
            cancel,
            state_machine: PipelineStateMachine::new(),
            simulated: Vec::new(),
        }
    }

    /// Prepare the package: bump the version, analyze, check formatting,
    /// test and let the registry check the archive
    pub async fn pre_publish(mut self, context: &ReleaseContext) -> PipelineOutcome {
        let span = hook_span(Hook::PrePublish, &context.version);

        async move {
            let result = self.run_pre_publish(context).await;
            self.finish(result)
        }
        .instrument(span)
        .await
    }

    /// Publish the package, or describe the publish in dry-run mode
    pub async fn post_publish(mut self, context: &ReleaseContext) -> PipelineOutcome {
        let span = hook_span(Hook::PostPublish, &context.version);

        async move {
            let result = self.run_post_publish(context).await;
            self.finish(result)
        }
        .instrument(span)
        .await
    }

    async fn run_pre_publish(&mut self, context: &ReleaseContext) -> Result<String, StepFailure> {
        let pubspec_path = self.resolve(&self.config.pubspec_path);
        let pubspec = self.load_manifest(&pubspec_path).await?;
        let flutter = ManifestValidator::is_framework_package(&pubspec);
        info!(package = %pubspec.name, flutter, "Loaded pubspec");

        match self.begin(Step::UpdateVersion, self.config.update_version) {
            StepMode::Execute => self
                .bump_version(&pubspec_path, &pubspec, &context.version)
                .await
                .map_err(Step::UpdateVersion.failed())?,
            StepMode::Simulate => info!(
                from = %pubspec.version,
                to = %context.version,
                "[DRY-RUN] Would update version"
            ),
            StepMode::Skip => {}
        }

        match self.begin(Step::Analyze, self.config.analyze) {
            StepMode::Execute => self
                .dart
                .analyze(&self.cancel)
                .await
                .map_err(Step::Analyze.failed())?,
            StepMode::Simulate => info!("[DRY-RUN] Would run dart analyze"),
            StepMode::Skip => {}
        }

        match self.begin(Step::FormatCheck, self.config.format_check) {
            StepMode::Execute => self
                .dart
                .format_check(&self.cancel)
                .await
                .map_err(Step::FormatCheck.failed())?,
            StepMode::Simulate => info!("[DRY-RUN] Would check code formatting"),
            StepMode::Skip => {}
        }

        // Flutter packages use their own runner and ignore test_config
        let test_step = if flutter { Step::FlutterTest } else { Step::Test };
        match self.begin(test_step, self.config.test) {
            StepMode::Execute if flutter => self
                .dart
                .flutter_test(&self.cancel)
                .await
                .map_err(test_step.failed())?,
            StepMode::Execute => self
                .dart
                .test(&self.config.test_config, &self.cancel)
                .await
                .map_err(test_step.failed())?,
            StepMode::Simulate => info!(
                config = ?self.config.test_config,
                flutter,
                "[DRY-RUN] Would run tests"
            ),
            StepMode::Skip => {}
        }

        match self.begin(Step::PublishDryRun, self.config.dry_run_validate) {
            StepMode::Execute => self
                .dart
                .publish_dry_run(&self.cancel)
                .await
                .map_err(Step::PublishDryRun.failed())?,
            StepMode::Simulate => info!("[DRY-RUN] Would run dart pub publish --dry-run"),
            StepMode::Skip => {}
        }

        if !self.config.dry_run {
            return Ok(PRE_PUBLISH_SUCCESS.to_string());
        }
        if self.simulated.is_empty() {
            return Ok(format!("[DRY-RUN] {}", PRE_PUBLISH_SUCCESS));
        }

        let simulated: Vec<&str> = self.simulated.iter().map(Step::label).collect();
        Ok(format!(
            "[DRY-RUN] {} (simulated: {})",
            PRE_PUBLISH_SUCCESS,
            simulated.join(", ")
        ))
    }

    async fn run_post_publish(&mut self, context: &ReleaseContext) -> Result<String, StepFailure> {
        let pubspec_path = self.resolve(&self.config.pubspec_path);
        let pubspec = self.load_manifest(&pubspec_path).await?;

        let version = if context.version.is_empty() {
            pubspec.version.clone()
        } else {
            context.version.clone()
        };
        let registry = self.registry_name();

        self.state_machine.transition(PipelineState::ResolvingCredentials);
        let credentials = self.resolve_credentials().await;

        info!(package = %pubspec.name, %version, %registry, "Publishing package");
        match self.begin(Step::Publish, true) {
            StepMode::Execute => self
                .dart
                .publish(
                    self.config.force,
                    credentials.as_ref(),
                    &self.config.hosted_url,
                    &self.cancel,
                )
                .await
                .map_err(Step::Publish.failed())?,
            StepMode::Simulate => info!(
                package = %pubspec.name,
                %version,
                force = self.config.force,
                exclude = ?self.config.exclude,
                "[DRY-RUN] Would publish package"
            ),
            StepMode::Skip => {}
        }

        if self.config.dry_run {
            Ok(format!(
                "[DRY-RUN] Would publish {}@{} to {}",
                pubspec.name, version, registry
            ))
        } else {
            Ok(format!("Published {}@{} to {}", pubspec.name, version, registry))
        }
    }

    /// Enter a gated step and report how it will be carried out
    fn begin(&mut self, step: Step, enabled: bool) -> StepMode {
        let mode = StepMode::decide(enabled, self.config.dry_run);

        match mode {
            StepMode::Skip => debug!(step = step.label(), "Step disabled"),
            StepMode::Simulate => {
                self.state_machine.transition(step.state());
                self.simulated.push(step);
            }
            StepMode::Execute => {
                self.state_machine.transition(step.state());
                info!(step = step.label(), "Running step");
            }
        }

        mode
    }

    async fn load_manifest(&mut self, path: &Path) -> Result<Pubspec, StepFailure> {
        self.state_machine.transition(PipelineState::LoadingManifest);
        parse_pubspec(path).await.map_err(Step::LoadManifest.failed())
    }

    async fn bump_version(
        &self,
        path: &Path,
        pubspec: &Pubspec,
        target: &str,
    ) -> Result<(), PluginError> {
        if target.is_empty() {
            return Err(PluginError::MissingReleaseVersion);
        }

        let validator = VersionValidator::new();
        let check = validator.validate(target);
        match &check.error {
            Some(reason) => warn!(version = target, %reason, "Release version is not valid SemVer"),
            None => {
                if let Some(build) = &check.build {
                    debug!(version = target, %build, "Release version carries a build number");
                }
                if validator.is_downgrade(&pubspec.version, target) {
                    warn!(from = %pubspec.version, to = target, "Release version is lower than the current version");
                }
            }
        }

        update_version(path, target).await?;
        info!(from = %pubspec.version, to = target, "Updated pubspec version");
        Ok(())
    }

    /// Explicit token first, then the credentials file
    ///
    /// A missing or unreadable credentials file is not an error here; the
    /// publish call fails later if it actually needs credentials.
    async fn resolve_credentials(&self) -> Option<PubCredentials> {
        if !self.config.access_token.is_empty() {
            let credentials = PubCredentials::from_token(self.config.access_token.as_str());
            debug!(token = %credentials.masked_token(), "Using configured access token");
            return Some(credentials);
        }

        let path = if self.config.credentials_path.is_empty() {
            PathBuf::new()
        } else {
            self.resolve(&self.config.credentials_path)
        };

        match CredentialStore::load(&path).await {
            Ok(credentials) => {
                if credentials.is_expired() {
                    warn!("Stored pub.dev credentials are expired");
                }
                debug!(token = %credentials.masked_token(), "Loaded stored credentials");
                Some(credentials)
            }
            Err(e) => {
                debug!(error = %e, "No stored credentials available");
                None
            }
        }
    }

    fn registry_name(&self) -> String {
        if self.config.hosted_url.is_empty() {
            DEFAULT_REGISTRY.to_string()
        } else {
            self.config.hosted_url.clone()
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.workdir.join(path)
    }

    fn finish(mut self, result: Result<String, StepFailure>) -> PipelineOutcome {
        let (success, message, failed_step, error_code) = match result {
            Ok(message) => {
                self.state_machine.transition(PipelineState::Succeeded);
                info!(%message, "Hook completed successfully");
                (true, message, None, None)
            }
            Err(failure) => {
                self.state_machine.transition(PipelineState::Failed);
                let message = failure.to_string();
                if failure.cause.is_cancellation() {
                    warn!(step = failure.step.label(), "Hook cancelled");
                } else {
                    error!(step = failure.step.label(), code = failure.cause.code(), %message, "Hook failed");
                }
                (
                    false,
                    message,
                    Some(failure.step),
                    Some(failure.cause.code().to_string()),
                )
            }
        };

        PipelineOutcome {
            success,
            message,
            state: self.state_machine.get_state(),
            failed_step,
            error_code,
            simulated: self.simulated,
            history: self.state_machine.get_history(),
            elapsed_ms: self.state_machine.get_elapsed_time(),
        }
    }
}

fn hook_span(hook: Hook, version: &str) -> tracing::Span {
    info_span!("pub", %hook, version, run_id = %Uuid::new_v4())
}
