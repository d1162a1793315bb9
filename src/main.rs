//! ytdlq CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ytdlq::cli::{commands, Cli, Commands};
use ytdlq::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging; -v wins over the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("ytdlq={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Add { urls, file } => {
            commands::run_add(urls, file.as_deref(), &settings)?;
        }

        Commands::List => {
            commands::run_list(&settings)?;
        }

        Commands::Remove { positions } => {
            commands::run_remove(positions, &settings)?;
        }

        Commands::Clear { finished } => {
            commands::run_clear(*finished, &settings)?;
        }

        Commands::Formats { url, options } => {
            commands::run_formats(url.as_deref(), options, &settings).await?;
        }

        Commands::Download { all, options } => {
            commands::run_download(*all, options, &settings).await?;
        }

        Commands::Get { url, options } => {
            commands::run_get(url, options, &settings).await?;
        }

        Commands::Doctor => {
            let path = config_path.clone().unwrap_or_else(Settings::default_config_path);
            commands::run_doctor(&settings, &path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
