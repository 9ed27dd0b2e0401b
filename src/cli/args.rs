//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// tinyssg static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Project directory to work in (default: current directory)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub curdir: Option<String>,

    /// Config file path, relative to the project directory
    #[arg(long, global = true, default_value = "tinyssg.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate the site once
    #[command(visible_alias = "g")]
    Gen {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Start the development server, rebuilding on change
    #[command(visible_alias = "d")]
    Dev {
        #[command(flatten)]
        build_args: BuildArgs,

        #[command(flatten)]
        serve_args: ServeArgs,
    },

    /// Remove the output directory
    #[command(visible_alias = "cls")]
    Clean {
        /// Output directory path (relative to project root)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        output: Option<PathBuf>,
    },
}

/// Shared build arguments for Gen and Dev commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Pages directory (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub pages: Option<PathBuf>,

    /// Static assets directory, copied into the output (relative to project root)
    #[arg(short, long = "static", value_hint = clap::ValueHint::DirPath)]
    pub static_dir: Option<PathBuf>,

    /// Libs directory for templates, data and `extends` bases (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub libs: Option<PathBuf>,

    /// Output directory (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Only generate these page files (repeatable)
    #[arg(short, long = "input", value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// Development server arguments
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Port number to listen on [default: 8000]
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Debounce wait before rebuilding, in milliseconds [default: 500]
    #[arg(short, long)]
    pub wait: Option<u64>,

    /// Do not log requests
    #[arg(short, long)]
    pub nolog: bool,

    /// Disable watching and automatic browser reload
    #[arg(short = 'r', long)]
    pub noreload: bool,

    /// Do not open the browser
    #[arg(short = 'N', long)]
    pub noopen: bool,
}
