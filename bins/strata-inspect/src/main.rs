mod cmd;
mod config;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode(args) => cmd::decode::run(args),
        Commands::Columns(args) => cmd::columns::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
