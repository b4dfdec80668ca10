//! UTXO Ledger CLI Application
//!
//! A command-line interface for exercising the ledger.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use utxo_ledger::cli;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(version = "0.1.0")]
#[command(about = "A minimal validated UTXO ledger in Rust", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the coinbase reward cap
    #[arg(short, long)]
    reward: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a three-block demo ledger and print it
    Demo {
        /// Print the chain as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a key pair and print its public key
    Keygen,

    /// Decode a transaction from its text form
    Decode {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { json } => {
            let config = cli::load_config(cli.config.as_deref(), cli.reward)?;
            cli::cmd_demo(config, json)?;
        }
        Commands::Keygen => cli::cmd_keygen()?,
        Commands::Decode { input } => cli::cmd_decode(&input)?,
    }

    Ok(())
}
