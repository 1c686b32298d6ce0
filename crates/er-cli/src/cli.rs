//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::rank::RankArgs;

/// Time-decayed influence ranking for email and messaging logs.
///
/// Reads directed, timestamped events and ranks correspondents by the
/// potential that flows to them along communication edges.
#[derive(Debug, Parser)]
#[command(name = "eventrank", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rank correspondents from an event log.
    Rank(RankArgs),

    /// Show the leaders of a saved snapshot.
    Top {
        /// Snapshot written by `rank --save`.
        snapshot: PathBuf,

        /// How many correspondents to show.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the ranks of specific correspondents in a saved snapshot.
    Get {
        /// Snapshot written by `rank --save`.
        snapshot: PathBuf,

        /// Correspondent ids.
        #[arg(required = true)]
        ids: Vec<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
