//! CLI-specific error types and mappings.
//!
//! Maps engine and settings errors to exit codes and user-facing messages.

use readaloud_core::SettingsError;
use readaloud_engine::ReaderError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Engine failure.
    #[error("{0}")]
    Engine(String),

    /// Argument or input error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Engine(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<ReaderError> for CliError {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::InvalidSettings(settings_err) => Self::Config(settings_err.to_string()),
            ReaderError::EmptyInput => Self::Arguments(err.to_string()),
            other => Self::Engine(other.to_string()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_a_usage_error() {
        let err = CliError::from(ReaderError::EmptyInput);
        assert!(matches!(err, CliError::Arguments(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn invalid_settings_map_to_config() {
        let err = CliError::from(ReaderError::InvalidSettings(SettingsError::InvalidPitch(3.0)));
        assert_eq!(err.exit_code(), 78);
        assert_eq!(
            err.to_string(),
            "Configuration error: Pitch must be between 0.0 and 2.0, got 3"
        );
    }

    #[test]
    fn engine_closed_is_general_failure() {
        let err = CliError::from(ReaderError::EngineClosed);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
        let err = CliError::from(io);
        assert_eq!(err.exit_code(), 74);
    }
}
