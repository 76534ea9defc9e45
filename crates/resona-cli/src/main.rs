//! Resona CLI - stimulus generation and playback from the command line.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "resona")]
#[command(author, version, about = "Resona experiment toolkit CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audio output devices
    Devices(commands::devices::DevicesArgs),

    /// Generate stimulus signals to WAV files
    Generate(commands::generate::GenerateArgs),

    /// Play a WAV file through the engine
    Play(commands::play::PlayArgs),

    /// Display WAV file information
    Info(commands::info::InfoArgs),

    /// Validate a session configuration file
    Session(commands::session::SessionArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Session(args) => commands::session::run(args),
    }
}
