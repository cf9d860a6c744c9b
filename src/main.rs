//! Parley - chat assistant CLI
//!
//! Main entry point for the Parley application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley::cli::{Cli, Commands};
use parley::commands;
use parley::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat => {
            tracing::info!("Starting interactive chat");
            commands::chat::run_chat(config).await?;
            Ok(())
        }
        Commands::Ask {
            prompt,
            files,
            save_image,
        } => {
            tracing::debug!(files = files.len(), "Sending single message");
            commands::ask::run_ask(config, prompt, files, save_image).await?;
            Ok(())
        }
        Commands::Reminders { command } => {
            commands::reminders::handle_reminders(config, command).await?;
            Ok(())
        }
        Commands::Memory { command } => {
            commands::memory::handle_memory(config, command).await?;
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "parley=debug" } else { "parley=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
