pub mod dart_cli;
pub mod pub_plugin;

pub use dart_cli::{DartCli, PUB_HOSTED_URL_ENV, PUB_TOKEN_ENV};
pub use pub_plugin::{PLUGIN_NAME, PubPlugin};
