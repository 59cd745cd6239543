//! Domain types for the read-aloud engine.
//!
//! Pure value types with no infrastructure dependencies.

mod sentence;
mod status;
mod voice;

pub use sentence::{AttemptId, SentenceUnit};
pub use status::{PlaybackState, PlaybackStatus, progress_percent};
pub use voice::{VoiceDescriptor, locale_family, locales_match};
