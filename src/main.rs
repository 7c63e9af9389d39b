//! taskloop CLI entry point.

use anyhow::Result;
use clap::Parser;
use taskloop::cli::{commands, Cli, Commands};
use taskloop::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("taskloop={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    // Execute command
    match &cli.command {
        Commands::Chat {
            thread,
            model,
            no_stream,
        } => {
            commands::run_chat(thread.clone(), model.clone(), *no_stream, settings).await?;
        }

        Commands::Run {
            prompt,
            thread,
            model,
            stream,
        } => {
            commands::run_prompt(prompt, thread.clone(), model.clone(), *stream, settings).await?;
        }

        Commands::Tools => {
            commands::run_tools(settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
