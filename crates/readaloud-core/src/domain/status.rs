//! Playback state machine labels and the status snapshot.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Current state of the playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlaybackState {
    /// No session. Also the state after `stop()`.
    #[default]
    Idle,

    /// A session is active and sentences are being submitted.
    Playing,

    /// A session is active but suspended by `pause()`.
    Paused,

    /// The last session played every sentence.
    Completed,
}

/// Snapshot of the controller, published after every transition.
// Wire-shape DTO: the three flags mirror the UI contract one-to-one.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    /// State machine label.
    pub state: PlaybackState,

    /// Whether a session exists.
    pub is_active: bool,

    /// Whether the session is playing (not paused).
    pub is_playing: bool,

    /// Whether the session is paused.
    pub is_paused: bool,

    /// Index of the sentence being spoken (or about to be).
    pub current_index: usize,

    /// Number of sentences in the session.
    pub total_sentences: usize,

    /// Completed share of the session, 0–100.
    pub progress_percent: f32,

    /// Retries spent on the current sentence.
    pub retry_count: u32,
}

impl PlaybackStatus {
    /// Status of an engine with no session.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Status after a session played to the end.
    #[must_use]
    pub fn completed(total_sentences: usize) -> Self {
        Self {
            state: PlaybackState::Completed,
            current_index: total_sentences,
            total_sentences,
            progress_percent: 100.0,
            ..Self::default()
        }
    }
}

/// Percentage of `index` over `total`, clamped to 0–100.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn progress_percent(index: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (index.min(total) as f32 / total as f32) * 100.0
}
