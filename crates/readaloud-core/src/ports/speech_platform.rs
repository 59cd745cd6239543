//! Speech platform port: the unreliable, event-driven synthesis subsystem.
//!
//! # Design Rules
//!
//! - The platform is an exclusive, unshared resource: one utterance at a
//!   time. Callers cancel whatever is speaking before submitting more.
//! - Lifecycle events are delivered through an [`UtteranceSink`] that is
//!   bound to the attempt that submitted the utterance. Implementations
//!   may call the sink from any thread, at any time, any number of times,
//!   or never. The engine treats all of these as possible.
//! - Nothing here assumes a runtime; the sink is a plain callback.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::domain::{AttemptId, VoiceDescriptor};

// ── Platform identity ────────────────────────────────────────────────────────

/// Which family of speech subsystem an adapter wraps.
///
/// Used to pick timer and polling defaults; see
/// [`PlatformProfile`](crate::settings::PlatformProfile).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PlatformKind {
    /// iOS / WebKit: late voice list, silent failures, spurious `canceled`.
    Ios,
    /// Android: slow engine warm-up between utterances.
    Android,
    /// Desktop OS speech services.
    #[default]
    Desktop,
    /// Browser Web Speech API on desktop engines.
    Web,
}

/// What the platform can do beyond `speak`/`cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCapabilities {
    /// `pause()` suspends the current utterance.
    pub can_pause: bool,
    /// `resume()` continues a paused utterance in place.
    pub can_resume: bool,
}

impl PlatformCapabilities {
    /// Pause and resume are both supported.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            can_pause: true,
            can_resume: true,
        }
    }

    /// Only `speak` and `cancel` are available.
    #[must_use]
    pub const fn speak_only() -> Self {
        Self {
            can_pause: false,
            can_resume: false,
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Error codes reported by speech platforms.
///
/// The string forms follow the Web Speech API `SpeechSynthesisErrorEvent`
/// codes so browser adapters can parse them directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PlatformErrorCode {
    Canceled,
    Interrupted,
    AudioBusy,
    AudioHardware,
    Network,
    SynthesisUnavailable,
    SynthesisFailed,
    LanguageUnavailable,
    VoiceUnavailable,
    TextTooLong,
    InvalidArgument,
    NotAllowed,
    /// The utterance never reported that it started speaking.
    SilentStart,
    /// Anything the adapter could not classify.
    #[strum(default)]
    Other(String),
}

impl PlatformErrorCode {
    /// Whether retrying the same utterance can reasonably succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Canceled | Self::Interrupted | Self::AudioBusy | Self::SilentStart | Self::Network
        )
    }
}

/// A failure reported by (or about) the speech platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("speech platform error ({code}){}", detail_suffix(.detail.as_deref()))]
pub struct PlatformError {
    /// Classified error code.
    pub code: PlatformErrorCode,
    /// Free-form adapter detail, if any.
    pub detail: Option<String>,
}

impl PlatformError {
    /// Create an error with no detail.
    #[must_use]
    pub const fn new(code: PlatformErrorCode) -> Self {
        Self { code, detail: None }
    }

    /// Create an error with adapter detail.
    pub fn with_detail(code: PlatformErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: Some(detail.into()),
        }
    }

    /// Whether retrying can reasonably succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
    }
}

impl From<PlatformErrorCode> for PlatformError {
    fn from(code: PlatformErrorCode) -> Self {
        Self::new(code)
    }
}

fn detail_suffix(detail: Option<&str>) -> String {
    detail.map(|d| format!(": {d}")).unwrap_or_default()
}

// ── Utterances ───────────────────────────────────────────────────────────────

/// One request to synthesize and speak a single sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Attempt that submitted this utterance.
    pub attempt: AttemptId,
    /// Sentence index within the session.
    pub index: usize,
    /// Text to speak.
    pub text: String,
    /// Speech rate multiplier (1.0 = normal).
    pub rate: f32,
    /// Pitch multiplier (1.0 = normal).
    pub pitch: f32,
    /// Volume (0.0–1.0).
    pub volume: f32,
    /// Voice to use; `None` means the platform default.
    pub voice: Option<VoiceDescriptor>,
}

/// Lifecycle events an utterance can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    /// Audio output began.
    Started,
    /// The utterance finished speaking.
    Ended,
    /// The utterance failed.
    Failed(PlatformError),
}

type Deliver = dyn Fn(AttemptId, UtteranceEvent) + Send + Sync;

/// Callback handle through which a platform reports utterance events.
///
/// Bound to the attempt that created it; every event it delivers is tagged
/// with that attempt id. Cheap to clone.
#[derive(Clone)]
pub struct UtteranceSink {
    attempt: AttemptId,
    deliver: Arc<Deliver>,
}

impl UtteranceSink {
    /// Create a sink for `attempt` that forwards events to `deliver`.
    pub fn new(
        attempt: AttemptId,
        deliver: impl Fn(AttemptId, UtteranceEvent) + Send + Sync + 'static,
    ) -> Self {
        Self {
            attempt,
            deliver: Arc::new(deliver),
        }
    }

    /// Attempt this sink reports for.
    #[must_use]
    pub const fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Report that audio output began.
    pub fn started(&self) {
        self.send(UtteranceEvent::Started);
    }

    /// Report that the utterance finished.
    pub fn ended(&self) {
        self.send(UtteranceEvent::Ended);
    }

    /// Report a failure.
    pub fn failed(&self, error: impl Into<PlatformError>) {
        self.send(UtteranceEvent::Failed(error.into()));
    }

    /// Report an arbitrary event.
    pub fn send(&self, event: UtteranceEvent) {
        (self.deliver)(self.attempt, event);
    }
}

impl fmt::Debug for UtteranceSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtteranceSink")
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}

// ── Port ─────────────────────────────────────────────────────────────────────

/// Backend-agnostic speech synthesis subsystem.
///
/// Implementations must be `Send + Sync`; the controller holds them behind
/// an `Arc` and calls them from its own task. None of the methods may
/// block for the duration of speech.
#[async_trait]
pub trait SpeechPlatform: Send + Sync {
    /// Platform family, used to choose timer defaults.
    fn kind(&self) -> PlatformKind;

    /// Pause/resume support.
    fn capabilities(&self) -> PlatformCapabilities;

    /// Voices currently known to the platform.
    ///
    /// May legitimately return an empty list until the platform has
    /// finished populating it.
    async fn voices(&self) -> Vec<VoiceDescriptor>;

    /// Submit an utterance. Returns immediately; progress is reported
    /// through `sink`. An `Err` means the request was rejected outright.
    fn speak(&self, utterance: Utterance, sink: UtteranceSink) -> Result<(), PlatformError>;

    /// Cancel the current utterance and flush anything pending.
    fn cancel(&self);

    /// Pause the current utterance. Returns `false` if unsupported.
    fn pause(&self) -> bool;

    /// Resume a paused utterance. Returns `false` if unsupported.
    fn resume(&self) -> bool;

    /// Whether the platform reports that it is producing audio.
    fn is_speaking(&self) -> bool;

    /// Whether the platform has queued utterances not yet spoken.
    fn is_pending(&self) -> bool;
}
