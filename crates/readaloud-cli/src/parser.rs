//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Read text aloud one sentence at a time.
///
/// Top-level parser: global options plus the subcommand to dispatch.
#[derive(Parser)]
#[command(name = "readaloud")]
#[command(about = "Read text aloud sentence by sentence")]
#[command(version)]
pub struct Cli {
    /// JSON settings file (missing fields take their defaults)
    #[arg(long = "config", global = true, env = "READALOUD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
