//! CLI module for the kiln console
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `serve` - Start the console server
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start server with default config
//! kiln serve
//!
//! # Reproducible synthetic telemetry on another port
//! kiln serve --port 9000 --telemetry-seed 42
//!
//! # Generate shell completions
//! kiln completions bash > ~/.bash_completion.d/kiln
//! ```

pub mod completions;
pub mod config;
pub mod serve;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// kiln.ai - live process console for kiln plants
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Live process console for kiln plants"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the console server
    Serve(ServeArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "kiln.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "KILN_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "KILN_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "KILN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Disable the synthetic telemetry feed
    #[arg(long)]
    pub no_telemetry: bool,

    /// Seed for the synthetic telemetry feed
    #[arg(long)]
    pub telemetry_seed: Option<u64>,

    /// Override the session idle timeout (seconds)
    #[arg(long)]
    pub idle_timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "kiln.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
