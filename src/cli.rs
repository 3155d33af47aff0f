use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vidlink")]
#[command(author, version, about = "Video upload, trim/merge and share link service")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "VIDLINK_CONFIG")]
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
        #[arg(long, env = "VIDLINK_HOST")]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long, env = "VIDLINK_PORT")]
        port: Option<u16>,
    },

    /// Report a file's duration and whether uploads would accept it
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that ffmpeg and ffprobe are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Remove interrupted writes left behind by a previous run.
    ///
    /// Deletes in-flight uploads and transcode outputs, so never run it while
    /// a server is using the same database and storage root. It refuses when
    /// a write started within the transcode timeout unless --force is given.
    Reconcile {
        /// Run even if a server appears to be writing
        #[arg(long)]
        force: bool,
    },

    /// Delete shared links that have expired
    PruneLinks {
        /// Only delete links that expired at least this many hours ago
        #[arg(long, default_value = "0")]
        older_than_hours: u32,
    },

    /// Display version information
    Version,
}
