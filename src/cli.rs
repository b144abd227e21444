use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediasort")]
#[command(author, version, about = "Sort pending media into library destinations")]
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
    /// Start the HTTP server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Pending media root (overrides library.input_path)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// List pending series with their video counts
    Series {
        /// Pending media root (overrides library.input_path)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the default assignments for a pending series
    Plan {
        /// Series directory name under the pending root
        #[arg(required = true)]
        series: String,

        /// Series name used in destinations (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,

        /// Pending media root (overrides library.input_path)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode an absolute path as a stream token
    EncodePath {
        #[arg(required = true)]
        path: String,
    },

    /// Decode a stream token back to its path
    DecodePath {
        #[arg(required = true)]
        token: String,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
