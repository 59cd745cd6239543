//! # readaloud-engine
//!
//! Plays long-form text aloud one sentence at a time on top of an
//! unreliable platform speech subsystem, emitting progress events that a UI
//! can use to highlight the active sentence.
//!
//! ```text
//!   play(text) → segmenter → controller ─┬─ voice resolver (once)
//!                                        ├─ speak sentence i ─→ platform
//!                                        ├─ watchdogs (backup, early detection)
//!                                        └─ first signal wins → next sentence
//! ```
//!
//! The [`Reader`] handle is the public surface; everything else runs on a
//! single controller task.

#![deny(unused_crate_dependencies)]

mod controller;
pub mod emitter;
pub mod error;
pub mod reader;
pub mod resilience;
pub mod segmenter;
pub mod sim;
pub mod text_utils;
pub mod voice;

// Re-export key types for convenience
pub use emitter::{ProgressMeta, ReaderCallbacks, ReaderEvent};
pub use error::ReaderError;
pub use reader::{Reader, ReaderOptions};
pub use resilience::{AttemptCounter, FailureAction, RetryPolicy, TimerKind, Watchdog};
pub use segmenter::{Segmenter, SegmenterConfig};
pub use sim::{Outcome, SimulatedPlatform, SpeechTiming};
pub use voice::VoiceResolver;

pub use readaloud_core::{
    AttemptId, PlatformCapabilities, PlatformError, PlatformErrorCode, PlatformKind,
    PlatformProfile, PlaybackState, PlaybackStatus, ReaderSettings, ResilienceOverrides,
    SentenceUnit, SettingsError, SpeechPlatform, Utterance, UtteranceEvent, UtteranceSink,
    VoiceDescriptor,
};

#[cfg(test)]
use mockall as _;
#[cfg(test)]
use serde_json as _;
