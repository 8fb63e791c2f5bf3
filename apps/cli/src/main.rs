//! DirectUp command-line client.

mod app;
mod config;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "directup", version)]
#[command(about = "Upload files straight to cloud storage through signed URLs")]
struct Cli {
    /// Broker base URL (overrides DIRECTUP_BACKEND_URL and the config file).
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Bearer token (overrides DIRECTUP_TOKEN and the config file).
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One-shot upload through a signed URL.
    Upload {
        #[arg(help = "Path to the file to upload")]
        file: PathBuf,
    },
    /// Pausable upload through a resumable session URL.
    Resumable {
        #[arg(help = "Path to the file to upload")]
        file: PathBuf,
    },
    /// List files you have uploaded.
    List,
    /// Show backend health.
    Health,
    /// Show the effective configuration.
    Config,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the upload output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = config::Config::load()?;
    let settings = config.resolve(cli.backend_url.as_deref(), cli.token.as_deref(), |key| {
        std::env::var(key).ok()
    });
    tracing::debug!(
        backend = %settings.backend_url,
        authenticated = settings.credential.is_some(),
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        match cli.command {
            Commands::Upload { file } => app::upload(&settings, &file).await,
            Commands::Resumable { file } => app::resumable(&settings, &file).await,
            Commands::List => app::list(&settings).await,
            Commands::Health => app::health(&settings).await,
            Commands::Config => {
                app::show_config(&settings, &config::config_path()?);
                Ok(())
            }
        }
    })
}
