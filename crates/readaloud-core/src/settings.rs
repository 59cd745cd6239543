//! Reader settings, per-platform timer profiles, and validation.
//!
//! These are pure domain types with no infrastructure dependencies. The
//! timer thresholds are empirically tuned per platform; they are exposed
//! here as configuration rather than baked into the controller.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ports::PlatformKind;

/// Retries allowed on one sentence before it is skipped.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Sentences longer than this are split at clause or word boundaries.
pub const DEFAULT_MAX_SENTENCE_CHARS: usize = 280;

/// Smallest accepted `max_sentence_chars`.
const MIN_SENTENCE_CHARS: usize = 40;

/// Upper bound for `max_retries`; more would only delay the skip.
const MAX_RETRIES_LIMIT: u32 = 10;

// ── Platform profile ─────────────────────────────────────────────────────────

/// Timer and polling thresholds for one platform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    /// Added to a sentence's estimated duration to form the backup timer.
    pub backup_buffer: Duration,

    /// Window after submission in which the platform must report that it
    /// started speaking. `None` disables early detection.
    pub early_detection: Option<Duration>,

    /// Gap between the end of one sentence and submission of the next.
    pub inter_sentence_delay: Duration,

    /// Delay before retrying a sentence after a transient failure.
    pub retry_delay: Duration,

    /// Number of times to ask for the voice list before giving up.
    pub voice_poll_attempts: u32,

    /// Base delay between voice list polls (grows linearly per attempt).
    pub voice_poll_interval: Duration,

    /// Cap for the voice poll delay.
    pub max_voice_poll_interval: Duration,
}

impl PlatformProfile {
    /// Default thresholds for a platform family.
    #[must_use]
    pub const fn for_kind(kind: PlatformKind) -> Self {
        match kind {
            PlatformKind::Ios => Self {
                backup_buffer: Duration::from_millis(1500),
                early_detection: Some(Duration::from_millis(1200)),
                inter_sentence_delay: Duration::from_millis(150),
                retry_delay: Duration::from_millis(300),
                voice_poll_attempts: 10,
                voice_poll_interval: Duration::from_millis(250),
                max_voice_poll_interval: Duration::from_millis(1000),
            },
            PlatformKind::Android => Self {
                backup_buffer: Duration::from_millis(2000),
                early_detection: None,
                inter_sentence_delay: Duration::from_millis(300),
                retry_delay: Duration::from_millis(400),
                voice_poll_attempts: 6,
                voice_poll_interval: Duration::from_millis(200),
                max_voice_poll_interval: Duration::from_millis(800),
            },
            PlatformKind::Desktop => Self {
                backup_buffer: Duration::from_millis(1000),
                early_detection: None,
                inter_sentence_delay: Duration::from_millis(100),
                retry_delay: Duration::from_millis(250),
                voice_poll_attempts: 3,
                voice_poll_interval: Duration::from_millis(100),
                max_voice_poll_interval: Duration::from_millis(400),
            },
            PlatformKind::Web => Self {
                backup_buffer: Duration::from_millis(1000),
                early_detection: None,
                inter_sentence_delay: Duration::from_millis(100),
                retry_delay: Duration::from_millis(250),
                voice_poll_attempts: 5,
                voice_poll_interval: Duration::from_millis(100),
                max_voice_poll_interval: Duration::from_millis(500),
            },
        }
    }

    /// Apply user overrides on top of this profile.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &ResilienceOverrides) -> Self {
        if let Some(ms) = overrides.backup_buffer_ms {
            self.backup_buffer = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.early_detection_ms {
            // 0 switches early detection off
            self.early_detection = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(ms) = overrides.inter_sentence_delay_ms {
            self.inter_sentence_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.retry_delay_ms {
            self.retry_delay = Duration::from_millis(ms);
        }
        if let Some(n) = overrides.voice_poll_attempts {
            self.voice_poll_attempts = n;
        }
        if let Some(ms) = overrides.voice_poll_interval_ms {
            self.voice_poll_interval = Duration::from_millis(ms);
        }
        self
    }
}

/// Optional per-field overrides of a [`PlatformProfile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResilienceOverrides {
    pub backup_buffer_ms: Option<u64>,
    /// `0` disables early detection.
    pub early_detection_ms: Option<u64>,
    pub inter_sentence_delay_ms: Option<u64>,
    pub retry_delay_ms: Option<u64>,
    pub voice_poll_attempts: Option<u32>,
    pub voice_poll_interval_ms: Option<u64>,
}

// ── Reader settings ──────────────────────────────────────────────────────────

/// Settings for one reader engine instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReaderSettings {
    /// Speech rate multiplier (1.0 = normal).
    pub rate: f32,

    /// Pitch multiplier (1.0 = normal).
    pub pitch: f32,

    /// Volume, 0.0–1.0.
    pub volume: f32,

    /// Preferred voice locale (e.g. `"en-US"`). Empty means no preference.
    pub locale: String,

    /// Platform family whose timer defaults apply. `None` uses the
    /// adapter's own [`kind`](crate::ports::SpeechPlatform::kind).
    pub platform: Option<PlatformKind>,

    /// Retries allowed per sentence before skipping it.
    pub max_retries: u32,

    /// Sentences longer than this are split further.
    pub max_sentence_chars: usize,

    /// Lowest accepted speech rate.
    pub min_rate: f32,

    /// Highest accepted speech rate.
    pub max_rate: f32,

    /// Estimated speaking time per word at rate 1.0, in milliseconds.
    pub ms_per_word: u64,

    /// Estimated speaking time per character at rate 1.0, in milliseconds.
    pub ms_per_char: u64,

    /// Floor for a sentence's duration estimate, in milliseconds.
    pub min_sentence_ms: u64,

    /// Overrides for the platform timer profile.
    pub resilience: ResilienceOverrides,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            locale: "en-US".to_string(),
            platform: None,
            max_retries: DEFAULT_MAX_RETRIES,
            max_sentence_chars: DEFAULT_MAX_SENTENCE_CHARS,
            min_rate: 0.5,
            max_rate: 2.0,
            ms_per_word: 250,
            ms_per_char: 25,
            min_sentence_ms: 400,
            resilience: ResilienceOverrides::default(),
        }
    }
}

impl ReaderSettings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Serialize settings as pretty JSON.
    pub fn to_json(&self) -> Result<String, SettingsError> {
        serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Effective timer profile for an adapter of kind `adapter_kind`.
    ///
    /// An explicit `platform` setting wins over the adapter's kind.
    #[must_use]
    pub fn profile(&self, adapter_kind: PlatformKind) -> PlatformProfile {
        let kind = self.platform.unwrap_or(adapter_kind);
        PlatformProfile::for_kind(kind).with_overrides(&self.resilience)
    }

    /// Clamp a requested rate into `[min_rate, max_rate]`.
    #[must_use]
    pub fn clamp_rate(&self, rate: f32) -> f32 {
        if rate.is_nan() {
            return self.rate;
        }
        rate.clamp(self.min_rate, self.max_rate)
    }

    /// Merge a partial update, only touching fields that are `Some`.
    pub fn merge(&mut self, update: &SettingsUpdate) {
        if let Some(rate) = update.rate {
            self.rate = rate;
        }
        if let Some(pitch) = update.pitch {
            self.pitch = pitch;
        }
        if let Some(volume) = update.volume {
            self.volume = volume;
        }
        if let Some(ref locale) = update.locale {
            self.locale.clone_from(locale);
        }
        if let Some(platform) = update.platform {
            self.platform = platform;
        }
        if let Some(retries) = update.max_retries {
            self.max_retries = retries;
        }
        if let Some(chars) = update.max_sentence_chars {
            self.max_sentence_chars = chars;
        }
    }
}

/// Partial settings update.
///
/// `platform` is `Option<Option<_>>`:
/// - `None` = don't change this field
/// - `Some(None)` = fall back to the adapter's kind
/// - `Some(Some(kind))` = force `kind`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
    pub locale: Option<String>,
    pub platform: Option<Option<PlatformKind>>,
    pub max_retries: Option<u32>,
    pub max_sentence_chars: Option<usize>,
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Rate bounds must satisfy 0 < min_rate <= max_rate, got {min}..={max}")]
    InvalidRateBounds { min: f32, max: f32 },

    #[error("Rate must be between {min} and {max}, got {value}")]
    InvalidRate { value: f32, min: f32, max: f32 },

    #[error("Pitch must be between 0.0 and 2.0, got {0}")]
    InvalidPitch(f32),

    #[error("Volume must be between 0.0 and 1.0, got {0}")]
    InvalidVolume(f32),

    #[error("max_retries must be at most 10, got {0}")]
    TooManyRetries(u32),

    #[error("max_sentence_chars must be at least 40, got {0}")]
    SentenceLimitTooSmall(usize),

    #[error("Duration estimate needs a positive per-word or per-character cost")]
    ZeroDurationModel,

    #[error("Failed to parse settings: {0}")]
    Parse(String),
}

/// Validate settings values.
pub fn validate_settings(settings: &ReaderSettings) -> Result<(), SettingsError> {
    let (min, max) = (settings.min_rate, settings.max_rate);
    if !(min > 0.0 && min <= max) {
        return Err(SettingsError::InvalidRateBounds { min, max });
    }
    if !(min..=max).contains(&settings.rate) {
        return Err(SettingsError::InvalidRate {
            value: settings.rate,
            min,
            max,
        });
    }
    if !(0.0..=2.0).contains(&settings.pitch) {
        return Err(SettingsError::InvalidPitch(settings.pitch));
    }
    if !(0.0..=1.0).contains(&settings.volume) {
        return Err(SettingsError::InvalidVolume(settings.volume));
    }
    if settings.max_retries > MAX_RETRIES_LIMIT {
        return Err(SettingsError::TooManyRetries(settings.max_retries));
    }
    if settings.max_sentence_chars < MIN_SENTENCE_CHARS {
        return Err(SettingsError::SentenceLimitTooSmall(
            settings.max_sentence_chars,
        ));
    }
    if settings.ms_per_word == 0 && settings.ms_per_char == 0 {
        return Err(SettingsError::ZeroDurationModel);
    }

    tracing::trace!(?settings, "Reader settings validated");
    Ok(())
}
