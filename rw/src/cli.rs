//! CLI argument parsing for rw

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rw")]
#[command(author, version, about = "Simulate server renders and report how they conclude", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a scenario file and print the render outcome
    Render {
        /// Scenario YAML file
        #[arg(required = true)]
        scenario: PathBuf,

        /// Override the render timeout in milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
