//! State tracking for a single hook run
//!
//! Transitions are recorded in memory only. Every hook invocation builds a
//! fresh machine, so a failed run is never resumed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    NotStarted,
    LoadingManifest,
    UpdatingVersion,
    Analyzing,
    CheckingFormat,
    Testing,
    ValidatingPublish,
    ResolvingCredentials,
    Publishing,
    Succeeded,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed)
    }
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    pub from: PipelineState,
    pub to: PipelineState,
    pub timestamp: DateTime<Utc>,
}

/// State machine for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStateMachine {
    current_state: PipelineState,
    transitions: Vec<StateTransition>,
    started_at: DateTime<Utc>,
}

impl Default for PipelineStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStateMachine {
    pub fn new() -> Self {
        Self {
            current_state: PipelineState::NotStarted,
            transitions: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Transition to a new state
    ///
    /// Once a terminal state is reached further transitions are ignored.
    pub fn transition(&mut self, to: PipelineState) {
        if self.current_state.is_terminal() {
            return;
        }

        self.transitions.push(StateTransition {
            from: self.current_state,
            to,
            timestamp: Utc::now(),
        });
        self.current_state = to;
    }

    pub fn get_state(&self) -> PipelineState {
        self.current_state
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    /// Milliseconds from construction to the latest transition
    pub fn get_elapsed_time(&self) -> i64 {
        self.transitions
            .last()
            .map(|t| (t.timestamp - self.started_at).num_milliseconds())
            .unwrap_or(0)
    }

    /// Transition history, one `From → To` entry per step
    pub fn get_history(&self) -> Vec<String> {
        self.transitions
            .iter()
            .map(|t| format!("{:?} → {:?}", t.from, t.to))
            .collect()
    }
}
