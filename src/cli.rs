use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "newreleases")]
#[command(author, version, about = "Recent releases from the artists you follow")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan followed and saved artists for recent releases
    Scan {
        /// Recency window in days (overrides config)
        #[arg(short, long)]
        days: Option<u32>,

        /// Try the search endpoint before scanning discographies
        #[arg(long)]
        optimized_search: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
