//! Sentence units and attempt identifiers.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One segment of input text, as produced by the segmenter.
///
/// Immutable once created. The estimated duration is a watchdog budget
/// only; the UI must not use it for highlighting timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceUnit {
    /// Sentence text, trimmed, punctuation included.
    pub text: String,

    /// Zero-based position in the session.
    pub index: usize,

    /// Number of whitespace-separated words.
    pub word_count: usize,

    /// Estimated speaking time at `rate`.
    #[serde(with = "duration_millis")]
    pub estimated_duration: Duration,

    /// Speech rate the estimate was computed for.
    pub rate: f32,
}

impl SentenceUnit {
    /// Number of characters (not bytes) in the sentence.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Re-scale the duration estimate to another speech rate.
    ///
    /// Estimates scale inversely with rate: doubling the rate halves the
    /// budget. Non-positive rates fall back to the original estimate.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn duration_at(&self, rate: f32) -> Duration {
        if rate <= 0.0 || self.rate <= 0.0 {
            return self.estimated_duration;
        }
        let scale = f64::from(self.rate) / f64::from(rate);
        Duration::from_nanos((self.estimated_duration.as_nanos() as f64 * scale).round() as u64)
    }
}

/// Identifier minted each time a sentence is (re)submitted to the platform.
///
/// Monotonic within one engine instance. Every deferred signal (platform
/// event, watchdog, scheduled step) carries the id it was armed for, so a
/// signal from a superseded attempt can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct AttemptId(u64);

impl AttemptId {
    /// The id that precedes every minted id.
    pub const ZERO: Self = Self(0);

    /// Return the id following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw numeric value (for logging).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(text: &str, millis: u64, rate: f32) -> SentenceUnit {
        SentenceUnit {
            text: text.to_string(),
            index: 0,
            word_count: text.split_whitespace().count(),
            estimated_duration: Duration::from_millis(millis),
            rate,
        }
    }

    #[test]
    fn duration_scales_inversely_with_rate() {
        let s = unit("Hello world.", 1000, 1.0);
        assert_eq!(s.duration_at(2.0), Duration::from_millis(500));
        assert_eq!(s.duration_at(0.5), Duration::from_millis(2000));
    }

    #[test]
    fn duration_at_ignores_non_positive_rate() {
        let s = unit("Hello world.", 1000, 1.0);
        assert_eq!(s.duration_at(0.0), Duration::from_millis(1000));
    }

    #[test]
    fn char_count_counts_scalar_values() {
        let s = unit("Café.", 100, 1.0);
        assert_eq!(s.char_count(), 5);
    }

    #[test]
    fn attempt_ids_are_monotonic() {
        let a = AttemptId::ZERO.next();
        let b = a.next();
        assert!(b > a);
        assert_eq!(b.get(), 2);
        assert_eq!(b.to_string(), "#2");
    }

    #[test]
    fn sentence_serializes_duration_as_millis() {
        let s = unit("Done.", 400, 1.0);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["estimatedDuration"], 400);
        assert_eq!(json["wordCount"], 1);
    }
}
