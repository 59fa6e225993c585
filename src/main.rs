// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "idscan")]
#[command(about = "Scan ID and registration barcodes from a camera feed")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.config/idscan/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play image files through the virtual camera and scan them
    Scan {
        /// Image files or directories of images, played in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Give up after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Decode a barcode from a single image
    Decode {
        /// Image file
        image: PathBuf,
    },

    /// Show the effective configuration
    Config {
        /// Print the configuration file location instead
        #[arg(long)]
        path: bool,

        /// Write the default configuration if no file exists yet
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=idscan=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Scan { files, timeout } => cli::scan_files(&files, timeout, config),
        Commands::Decode { image } => cli::decode_image(&image, config),
        Commands::Config { path, write } => cli::show_config(config, path, write),
    }
}
