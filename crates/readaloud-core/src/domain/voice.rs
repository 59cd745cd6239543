//! Synthesis voice descriptors and locale matching.

use serde::{Deserialize, Serialize};

/// A voice offered by the platform speech subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDescriptor {
    /// Platform identifier, if the platform distinguishes it from the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Human-readable voice name.
    pub name: String,

    /// BCP-47 style locale tag (e.g. `"en-US"`, `"en_GB"`, `"fr"`).
    pub lang: String,

    /// Lower is better. Platforms rank enhanced/neural voices first.
    pub platform_preference_rank: u32,

    /// Whether the platform marks this voice as its default.
    #[serde(default)]
    pub is_default: bool,
}

impl VoiceDescriptor {
    /// Create a voice with the given name, locale, and rank.
    pub fn new(name: impl Into<String>, lang: impl Into<String>, rank: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            lang: lang.into(),
            platform_preference_rank: rank,
            is_default: false,
        }
    }

    /// Mark this voice as the platform default.
    #[must_use]
    pub const fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Attach a platform identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Compare two locale tags, ignoring case and the `_`/`-` separator.
#[must_use]
pub fn locales_match(a: &str, b: &str) -> bool {
    normalize_locale(a) == normalize_locale(b)
}

/// Language family of a locale tag (`"en-US"` → `"en"`), lowercased.
#[must_use]
pub fn locale_family(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-").to_ascii_lowercase()
}
