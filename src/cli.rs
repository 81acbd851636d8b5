use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "engine-registry")]
#[command(about = "Discover, verify and rank media transcoding engines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List engines in priority order (enabled and available only by default)
    List {
        /// Include disabled and unavailable engines
        #[arg(long)]
        all: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the verification result of every executable of one engine
    Check {
        /// Engine identifier, e.g. FFmpegVideo
        id: String,
    },

    /// Find the engines able to handle a file or URL
    Match {
        /// Media file path or stream URL
        resource: String,

        /// Show every compatible engine, not only the preferred one
        #[arg(long)]
        all: bool,
    },

    /// Show the probe result recorded for each executable
    Cache,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
