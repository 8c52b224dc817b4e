//! pub-publisher CLI
//!
//! Runs the pub.dev release plugin outside a release host: describe the
//! plugin, validate a configuration, or execute a single hook. The response
//! is printed as JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pub_publisher::{
    ConfigLoader, ExecuteRequest, Hook, PubPlugin, ReleaseContext, ReleasePlugin,
    SafeCommandExecutor,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Publish Dart and Flutter packages to pub.dev
#[derive(Parser)]
#[command(name = "pub-publisher")]
#[command(version)]
#[command(about = "Publish Dart and Flutter packages to pub.dev", long_about = None)]
struct Cli {
    /// Plugin configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Package directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    workdir: Option<PathBuf>,

    /// Simulate side-effecting steps
    #[arg(long, global = true)]
    dry_run: bool,

    /// Kill SDK commands running longer than this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show plugin information
    Info,

    /// Check the Dart SDK and pubspec.yaml
    Validate,

    /// Run a lifecycle hook
    Execute {
        /// Hook to run
        #[arg(long, value_enum)]
        hook: Hook,

        /// Version being released
        #[arg(long, default_value = "")]
        release_version: String,

        /// Version released before this one
        #[arg(long, default_value = "")]
        previous_version: String,

        /// Git tag of the release
        #[arg(long, default_value = "")]
        tag_name: String,
    },
}

#[tokio::main]
async fn main() {
    init_logging();

    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pub_publisher=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let workdir = match cli.workdir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_file(path).await?,
        None => Map::new(),
    };

    let mut executor = SafeCommandExecutor::new(&workdir)?;
    if let Some(secs) = cli.timeout_secs {
        executor.set_timeout(Duration::from_secs(secs));
    }
    let plugin = PubPlugin::new(Arc::new(executor), workdir);

    match cli.command {
        Commands::Info => {
            print_json(&plugin.info())?;
            Ok(0)
        }
        Commands::Validate => {
            let response = plugin.validate(&config).await?;
            print_json(&response)?;
            Ok(if response.valid { 0 } else { 1 })
        }
        Commands::Execute {
            hook,
            release_version,
            previous_version,
            tag_name,
        } => {
            let request = ExecuteRequest {
                hook,
                config,
                context: ReleaseContext {
                    version: release_version,
                    previous_version,
                    tag_name,
                },
                dry_run: cli.dry_run,
            };

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling running command");
                    on_interrupt.cancel();
                }
            });

            let response = plugin.execute(request, cancel).await?;
            print_json(&response)?;
            Ok(if response.success { 0 } else { 1 })
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json: Value = serde_json::to_value(value)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
