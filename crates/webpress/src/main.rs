//! Webpress CLI - JPEG/PNG to WebP conversion service and batch tools.
//!
//! Webpress converts JPEG and PNG images to WebP, either as an authenticated
//! HTTP service or as batch tools that walk directories on disk. Conversion
//! results are cached by content fingerprint so repeated requests skip the
//! codec entirely.
//!
//! # Usage
//!
//! ```bash
//! # Run the HTTP conversion service
//! webpress serve --port 3000
//!
//! # Convert a directory in place (foo.jpg -> foo.webp alongside it)
//! webpress convert-dir ./photos/
//!
//! # Convert into a mirrored output tree, sampling 100 files
//! webpress batch ./photos/ --output ./photos-webp --limit 100
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod server;

/// Webpress - JPEG/PNG to WebP conversion service and batch tools.
#[derive(Parser, Debug)]
#[command(name = "webpress")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the authenticated HTTP conversion service
    Serve(server::ServeArgs),

    /// Convert a directory of images in place
    ConvertDir(cli::convert_dir::ConvertDirArgs),

    /// Convert a directory into a mirrored output tree
    Batch(cli::batch::BatchArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match webpress_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Failed to load config: {e}\n  Using default configuration.");
            webpress_core::Config::default()
        }
    };
    logging::init(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("Webpress v{}", webpress_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Serve(args) => server::execute(args, config).await,
        Commands::ConvertDir(args) => cli::convert_dir::execute(args, config).await,
        Commands::Batch(args) => cli::batch::execute(args, config).await,
    }
}
