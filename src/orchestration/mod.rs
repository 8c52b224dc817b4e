//! Orchestration layer for pub publishing
//!
//! This module sequences the manifest, validation and SDK steps that make up
//! each lifecycle hook.

pub mod pipeline;

pub use pipeline::{
    DEFAULT_REGISTRY, PipelineOutcome, PublishPipeline, Step, StepFailure, StepMode,
};
