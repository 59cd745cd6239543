//! # readaloud-cli
//!
//! Command-line front end for the readaloud engine. Reads text aloud through
//! the simulated speech platform, and exposes the segmenter, the voice
//! resolver, and the effective settings for inspection.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Subscriber is installed by the binary only.
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::CliConfig;
pub use commands::{Commands, ConfigCommand};
pub use error::CliError;
pub use parser::Cli;
