//! tinyssg - a tiny static site generator.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use tinyssg::{
    cli::{self, Cli, Commands},
    config::{SiteConfig, init_config},
    core,
};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(SiteConfig::load(&cli)?);

    match &cli.command {
        Commands::Gen { build_args } => cli::generate::generate_site(&config, &build_args.inputs),
        Commands::Dev { build_args, .. } => cli::serve::serve_site(&build_args.inputs),
        Commands::Clean { .. } => cli::generate::clean_site(&config),
    }
}
