//! # readaloud-core
//!
//! Domain types and port definitions shared by the readaloud engine and its
//! adapters. Nothing in this crate schedules work or owns a runtime: it
//! describes *what* a sentence, a voice, and a speech platform are, and
//! which settings tune the engine.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    AttemptId, PlaybackState, PlaybackStatus, SentenceUnit, VoiceDescriptor, locale_family,
    locales_match, progress_percent,
};
pub use ports::{
    PlatformCapabilities, PlatformError, PlatformErrorCode, PlatformKind, SpeechPlatform,
    Utterance, UtteranceEvent, UtteranceSink,
};
pub use settings::{
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_SENTENCE_CHARS, PlatformProfile, ReaderSettings,
    ResilienceOverrides, SettingsError, SettingsUpdate, validate_settings,
};

#[cfg(test)]
use tokio as _;
