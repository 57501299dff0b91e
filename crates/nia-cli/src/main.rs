use anyhow::Result;
use clap::{Parser, Subcommand};
use nia_application::AppBootstrap;
use nia_infrastructure::{ConfigService, NiaPaths};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;

#[derive(Parser)]
#[command(name = "nia")]
#[command(about = "Nia - sign in with your PIN and chat with your learning buddy", long_about = None)]
struct Cli {
    /// Use this directory instead of the platform config directory
    #[arg(long, global = true, value_name = "PATH")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick your profile, enter your PIN and start chatting
    Login,
    /// Chat with Nia (requires a signed-in child)
    Chat,
    /// Show who is signed in on this device
    Whoami,
    /// Sign out
    Logout,
}

/// Logs go to stderr so chat output on stdout stays clean.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = NiaPaths::new(cli.config_dir);
    let config = ConfigService::new(paths.clone()).get_config();
    init_logging(&config.debug.log_level);

    let usecase = AppBootstrap::new(config, paths).build().await?;

    match cli.command {
        Commands::Login => commands::login::run(&usecase).await?,
        Commands::Chat => commands::chat::run(&usecase).await?,
        Commands::Whoami => commands::session::whoami(&usecase),
        Commands::Logout => commands::session::logout(&usecase).await,
    }

    Ok(())
}
