pub mod command_executor;
pub mod credentials;

pub use command_executor::{
    CommandError, CommandOutput, CommandRunner, Invocation, SafeCommandExecutor,
};
pub use credentials::{CREDENTIALS_FILE, CredentialStore, PubCredentials, mask_token};
