pub mod config;
pub mod config_loader;
pub mod error;
pub mod state_machine;
pub mod traits;

pub use config::*;
pub use config_loader::{ACCESS_TOKEN_ENV, ConfigLoader, ConfigParser, HOSTED_URL_ENV};
pub use error::*;
pub use state_machine::{PipelineState, PipelineStateMachine, StateTransition};
pub use traits::*;
