//! Tagsmith CLI entry point.

use clap::Parser;

use tagsmith::cli::{Cli, Commands};
use tagsmith::infrastructure::{config::ConfigLoader, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err:#}");
            std::process::exit(2);
        }
    };

    let _guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Logging setup error: {err:#}");
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Analyze(args) => {
            tagsmith::cli::commands::analyze::execute(args, &config, cli.json).await
        }
        Commands::Status(args) => {
            tagsmith::cli::commands::status::execute(args, &config, cli.json).await
        }
    };

    if let Err(err) = result {
        tagsmith::cli::handle_error(&err, cli.json);
    }
}
