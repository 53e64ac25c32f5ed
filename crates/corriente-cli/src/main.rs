//! Corriente CLI - wire and run demand-driven signal graphs.

mod commands;
mod config;
mod framing;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "corriente")]
#[command(author, version, about = "Corriente pull-graph DSP CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full-duplex FSK audio modem
    Modem(commands::modem::ModemArgs),

    /// Build and print a framed, Manchester-coded bit stream
    Frame(commands::frame::FrameArgs),

    /// Compute or validate a CRC over hex data
    Crc(commands::crc::CrcArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Modem(args) => commands::modem::run(args),
        Commands::Frame(args) => commands::frame::run(args),
        Commands::Crc(args) => commands::crc::run(args),
    }
}
