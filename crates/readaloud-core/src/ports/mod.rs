//! Port definitions (trait abstractions) for external collaborators.
//!
//! Ports describe *what* the engine needs from the outside world, never
//! *how* it is provided. Adapters (browser bridges, OS speech services, the
//! simulated platform used in tests) implement these traits.

mod speech_platform;

pub use speech_platform::{
    PlatformCapabilities, PlatformError, PlatformErrorCode, PlatformKind, SpeechPlatform,
    Utterance, UtteranceEvent, UtteranceSink,
};
