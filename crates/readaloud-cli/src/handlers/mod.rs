//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(config: &CliConfig, ..., out: &mut impl Write) -> Result<_>`
//! - Thin wrappers that:
//!   1. Merge flag overrides into the loaded settings
//!   2. Call into the engine
//!   3. Format output for the terminal
//!
//! Writing to a caller-supplied sink keeps handlers testable without a
//! terminal.

pub mod config;
pub mod read;
pub mod segment;
pub mod voices;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Read the input text from `file`, or stdin when it is `None` or `"-"`.
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .map_err(crate::CliError::from)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(crate::CliError::from)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::CliError;

    #[test]
    fn reads_named_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Hello world.").unwrap();
        assert_eq!(read_input(Some(file.path())).unwrap(), "Hello world.");
    }

    #[test]
    fn missing_file_keeps_io_classification() {
        let err = read_input(Some(Path::new("/nonexistent/article.txt"))).unwrap_err();
        let cli = err.downcast_ref::<CliError>().unwrap();
        assert_eq!(cli.exit_code(), 74);
        assert!(err.to_string().contains("/nonexistent/article.txt"));
    }
}
