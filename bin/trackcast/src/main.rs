mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "trackcast")]
#[command(about = "Republishes in-browser media playback state over a push channel", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (defaults to ~/.trackcast/config.json)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the browser and republish playback state until interrupted
    Monitor,

    /// Probe the debugging endpoint and report what would be monitored
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the active configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(trackcast_core::Config::default_path);

    match cli.command {
        Commands::Monitor => {
            commands::monitor::run(&config_path).await?;
        }
        Commands::Status => {
            commands::status::run(&config_path).await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                commands::config_cmd::show(&config_path)?;
            }
            ConfigCommands::Init { force } => {
                commands::config_cmd::init(&config_path, force)?;
            }
        },
    }

    Ok(())
}
