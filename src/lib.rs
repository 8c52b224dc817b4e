pub mod core;
pub mod manifest;
pub mod orchestration;
pub mod plugins;
pub mod security;
pub mod validation;

pub use crate::core::*;
pub use manifest::{Pubspec, parse_pubspec, update_version};
pub use orchestration::{PipelineOutcome, PublishPipeline, StepMode};
pub use plugins::{DartCli, PubPlugin};
pub use security::{
    CommandError, CommandRunner, CredentialStore, PubCredentials, SafeCommandExecutor,
};
pub use validation::{ManifestValidator, RuleViolation};
