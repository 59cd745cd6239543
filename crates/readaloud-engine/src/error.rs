//! Reader error types.

use readaloud_core::{PlatformError, SettingsError};

/// Errors produced by the read-aloud engine.
///
/// Only [`FatalPlatform`](ReaderError::FatalPlatform) ever reaches the
/// `on_error` callback; the others are returned from handle methods or
/// resolved inside the controller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReaderError {
    /// The input text contains no playable sentences.
    #[error("Nothing to read: input contains no sentences")]
    EmptyInput,

    /// No synthesis voice could be selected; the platform default is used.
    #[error("No synthesis voice available, falling back to the platform default")]
    VoiceUnavailable,

    /// A retryable platform failure (spurious cancel, silent start, ...).
    #[error("Transient platform failure on sentence {index} (retry {retry}): {source}")]
    TransientPlatform {
        index: usize,
        retry: u32,
        source: PlatformError,
    },

    /// A sentence could not be spoken and was skipped.
    #[error("Skipped sentence {index} after {attempts} attempt(s): {source}")]
    FatalPlatform {
        index: usize,
        attempts: u32,
        source: PlatformError,
    },

    /// Playback ended because `stop()` was called.
    #[error("Playback stopped before completion")]
    UserCancelled,

    /// The controller task is no longer running.
    #[error("Reader engine has shut down")]
    EngineClosed,

    /// Settings failed validation.
    #[error("Invalid reader settings: {0}")]
    InvalidSettings(#[from] SettingsError),
}

impl ReaderError {
    /// Whether this error should be shown to the user.
    ///
    /// Cancellation and voice fallback are expected conditions.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        !matches!(self, Self::UserCancelled | Self::VoiceUnavailable)
    }
}
