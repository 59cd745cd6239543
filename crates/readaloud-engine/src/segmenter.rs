//! Text segmentation: raw article text → ordered [`SentenceUnit`]s.

use std::time::Duration;

use readaloud_core::{ReaderSettings, SentenceUnit};

use crate::text_utils::{count_words, normalize_text, split_long_sentence, split_sentences};

/// Parameters for segmentation and duration estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmenterConfig {
    /// Sentences longer than this (in characters) are split further.
    pub max_sentence_chars: usize,
    /// Estimated speaking cost per word at rate 1.0.
    pub ms_per_word: u64,
    /// Estimated speaking cost per character at rate 1.0.
    pub ms_per_char: u64,
    /// Floor for an estimate at rate 1.0.
    pub min_sentence_ms: u64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self::from(&ReaderSettings::default())
    }
}

impl From<&ReaderSettings> for SegmenterConfig {
    fn from(settings: &ReaderSettings) -> Self {
        Self {
            max_sentence_chars: settings.max_sentence_chars,
            ms_per_word: settings.ms_per_word,
            ms_per_char: settings.ms_per_char,
            min_sentence_ms: settings.min_sentence_ms,
        }
    }
}

/// Splits text into sentence units with duration estimates.
///
/// Pure and deterministic: the same text and rate always produce the same
/// units.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    #[must_use]
    pub const fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment `text` into sentences estimated at speech `rate`.
    ///
    /// Empty or whitespace-only input yields an empty vector. Indices are
    /// contiguous from 0.
    #[must_use]
    pub fn segment(&self, text: &str, rate: f32) -> Vec<SentenceUnit> {
        let rate = if rate > 0.0 { rate } else { 1.0 };
        let normalized = normalize_text(text);

        split_sentences(&normalized)
            .iter()
            .flat_map(|sentence| split_long_sentence(sentence, self.config.max_sentence_chars))
            .filter(|s| !s.is_empty())
            .enumerate()
            .map(|(index, text)| {
                let word_count = count_words(&text);
                let estimated_duration = self.estimate_duration(&text, rate);
                SentenceUnit {
                    text,
                    index,
                    word_count,
                    estimated_duration,
                    rate,
                }
            })
            .collect()
    }

    /// Estimated speaking time of `text` at `rate`.
    ///
    /// `max(words × ms_per_word + chars × ms_per_char, min_sentence_ms) / rate`.
    #[must_use]
    pub fn estimate_duration(&self, text: &str, rate: f32) -> Duration {
        let words = count_words(text) as u64;
        let chars = text.chars().count() as u64;
        let base = words
            .saturating_mul(self.config.ms_per_word)
            .saturating_add(chars.saturating_mul(self.config.ms_per_char))
            .max(self.config.min_sentence_ms);
        if rate <= 0.0 {
            return Duration::from_millis(base);
        }
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = (base as f64 / f64::from(rate)).round() as u64;
        Duration::from_millis(scaled)
    }
}
