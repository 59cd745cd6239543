//! Voice resolution.
//!
//! Platforms may report an empty voice list until some time after startup,
//! so the resolver polls with a capped linear backoff and then picks the
//! best voice for the preferred locale.

use std::time::Duration;

use readaloud_core::{
    PlatformProfile, SpeechPlatform, VoiceDescriptor, locale_family, locales_match,
};
use tracing::{debug, warn};

use crate::error::ReaderError;

/// Picks a synthesis voice for a locale.
#[derive(Debug, Clone)]
pub struct VoiceResolver {
    locale: String,
    attempts: u32,
    interval: Duration,
    max_interval: Duration,
}

impl VoiceResolver {
    /// Create a resolver for `locale` using the polling thresholds of
    /// `profile`.
    pub fn new(locale: impl Into<String>, profile: &PlatformProfile) -> Self {
        Self {
            locale: locale.into(),
            attempts: profile.voice_poll_attempts.max(1),
            interval: profile.voice_poll_interval,
            max_interval: profile.max_voice_poll_interval,
        }
    }

    /// Preferred locale.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Poll the platform until it reports voices, then select one.
    ///
    /// Returns `None` when the list stays empty for every attempt; the
    /// caller then speaks with the platform default voice.
    pub async fn resolve(&self, platform: &dyn SpeechPlatform) -> Option<VoiceDescriptor> {
        for attempt in 0..self.attempts {
            let voices = platform.voices().await;
            if !voices.is_empty() {
                let voice = self.select(&voices);
                debug!(
                    locale = %self.locale,
                    attempt,
                    available = voices.len(),
                    voice = ?voice.as_ref().map(|v| v.name.as_str()),
                    "Voice list ready"
                );
                return voice;
            }

            if attempt + 1 < self.attempts {
                let delay = self.backoff(attempt);
                debug!(attempt, ?delay, "Voice list empty, polling again");
                tokio::time::sleep(delay).await;
            }
        }

        warn!(
            locale = %self.locale,
            attempts = self.attempts,
            "{}",
            ReaderError::VoiceUnavailable
        );
        None
    }

    /// Select the best voice from a non-empty list.
    ///
    /// Tiers, first non-empty wins: exact locale match, same language
    /// family, any voice. Within a tier the lowest
    /// `platform_preference_rank` wins, with the platform default breaking
    /// ties.
    #[must_use]
    pub fn select(&self, voices: &[VoiceDescriptor]) -> Option<VoiceDescriptor> {
        let locale = self.locale.trim();
        if !locale.is_empty() {
            if let Some(v) = best(voices.iter().filter(|v| locales_match(&v.lang, locale))) {
                return Some(v);
            }

            let family = locale_family(locale);
            if let Some(v) = best(voices.iter().filter(|v| locale_family(&v.lang) == family)) {
                return Some(v);
            }
        }

        best(voices.iter())
    }

    /// Delay before poll number `attempt + 1`: linear growth, capped.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.interval
            .saturating_mul(attempt.saturating_add(1))
            .min(self.max_interval)
    }
}

fn best<'a>(voices: impl Iterator<Item = &'a VoiceDescriptor>) -> Option<VoiceDescriptor> {
    voices
        .min_by_key(|v| (v.platform_preference_rank, !v.is_default))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use readaloud_core::{
        PlatformCapabilities, PlatformError, PlatformKind, Utterance, UtteranceSink,
    };

    mock! {
        Platform {}

        #[async_trait::async_trait]
        impl SpeechPlatform for Platform {
            fn kind(&self) -> PlatformKind;
            fn capabilities(&self) -> PlatformCapabilities;
            async fn voices(&self) -> Vec<VoiceDescriptor>;
            fn speak(&self, utterance: Utterance, sink: UtteranceSink) -> Result<(), PlatformError>;
            fn cancel(&self);
            fn pause(&self) -> bool;
            fn resume(&self) -> bool;
            fn is_speaking(&self) -> bool;
            fn is_pending(&self) -> bool;
        }
    }

    fn profile(attempts: u32) -> PlatformProfile {
        PlatformProfile {
            voice_poll_attempts: attempts,
            voice_poll_interval: Duration::from_millis(100),
            max_voice_poll_interval: Duration::from_millis(250),
            ..PlatformProfile::for_kind(PlatformKind::Desktop)
        }
    }

    fn catalogue() -> Vec<VoiceDescriptor> {
        vec![
            VoiceDescriptor::new("Daniel", "en-GB", 1),
            VoiceDescriptor::new("Alex", "en-US", 2),
            VoiceDescriptor::new("Samantha", "en_US", 1),
            VoiceDescriptor::new("Amélie", "fr-CA", 0),
            VoiceDescriptor::new("Thomas", "fr-FR", 0).as_default(),
        ]
    }

    #[test]
    fn exact_locale_wins() {
        let resolver = VoiceResolver::new("en-US", &profile(1));
        let voice = resolver.select(&catalogue()).unwrap();
        assert_eq!(voice.name, "Samantha");
    }

    #[test]
    fn falls_back_to_language_family() {
        let resolver = VoiceResolver::new("en-AU", &profile(1));
        let voice = resolver.select(&catalogue()).unwrap();
        assert_eq!(voice.name, "Daniel");
    }

    #[test]
    fn default_flag_breaks_rank_ties() {
        let resolver = VoiceResolver::new("fr", &profile(1));
        let voice = resolver.select(&catalogue()).unwrap();
        assert_eq!(voice.name, "Thomas");
    }

    #[test]
    fn unknown_locale_takes_best_ranked_voice() {
        let resolver = VoiceResolver::new("ja-JP", &profile(1));
        let voice = resolver.select(&catalogue()).unwrap();
        assert_eq!(voice.name, "Thomas");
    }

    #[test]
    fn empty_list_selects_nothing() {
        let resolver = VoiceResolver::new("en-US", &profile(1));
        assert!(resolver.select(&[]).is_none());
    }

    #[test]
    fn backoff_is_linear_and_capped() {
        let resolver = VoiceResolver::new("en-US", &profile(5));
        assert_eq!(resolver.backoff(0), Duration::from_millis(100));
        assert_eq!(resolver.backoff(1), Duration::from_millis(200));
        assert_eq!(resolver.backoff(2), Duration::from_millis(250));
        assert_eq!(resolver.backoff(9), Duration::from_millis(250));
    }

    #[test]
    fn ready_catalogue_resolves_without_waiting() {
        let mut platform = MockPlatform::new();
        platform.expect_voices().times(1).returning(catalogue);

        let resolver = VoiceResolver::new("en-GB", &profile(3));
        let voice = tokio_test::block_on(resolver.resolve(&platform));
        assert_eq!(voice.map(|v| v.name), Some("Daniel".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_voices_appear() {
        let mut platform = MockPlatform::new();
        let mut calls = 0_u32;
        platform.expect_voices().times(3).returning(move || {
            calls += 1;
            if calls < 3 { Vec::new() } else { catalogue() }
        });

        let resolver = VoiceResolver::new("en-US", &profile(5));
        let start = tokio::time::Instant::now();
        let voice = resolver.resolve(&platform).await;

        assert_eq!(voice.map(|v| v.name), Some("Samantha".to_string()));
        // 100ms + 200ms of backoff before the third poll
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(300), "waited {waited:?}");
        assert!(waited < Duration::from_millis(350), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_configured_attempts() {
        let mut platform = MockPlatform::new();
        platform.expect_voices().times(3).returning(Vec::new);

        let resolver = VoiceResolver::new("en-US", &profile(3));
        assert!(resolver.resolve(&platform).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_polls_once() {
        let mut platform = MockPlatform::new();
        platform.expect_voices().times(1).returning(catalogue);

        let resolver = VoiceResolver::new("fr-FR", &profile(0));
        let voice = resolver.resolve(&platform).await.unwrap();
        assert_eq!(voice.name, "Thomas");
    }
}
