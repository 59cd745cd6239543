//! CLI bootstrap - the composition root.
//!
//! Settings are layered: defaults, then the JSON file given by `--config`
//! (or `READALOUD_CONFIG`), then per-command flags. The result is validated
//! once here so handlers can assume it is sound. This is also the only
//! place that picks the concrete [`SpeechPlatform`] implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use readaloud_core::{
    PlatformKind, PlatformProfile, ReaderSettings, SettingsUpdate, validate_settings,
};
use readaloud_engine::{SimulatedPlatform, SpeechPlatform};
use tracing::debug;

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Effective reader settings.
    pub settings: ReaderSettings,
    /// File the settings were read from, if any.
    pub source: Option<PathBuf>,
}

impl CliConfig {
    /// Load settings from `path`, or use defaults when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let json = std::fs::read_to_string(path)
            .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
        let settings = ReaderSettings::from_json(&json)
            .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?;
        validate_settings(&settings)?;
        debug!(path = %path.display(), "Loaded settings");

        Ok(Self {
            settings,
            source: Some(path.to_path_buf()),
        })
    }

    /// Settings with `update` merged on top, validated.
    pub fn settings_with(&self, update: &SettingsUpdate) -> Result<ReaderSettings, CliError> {
        let mut settings = self.settings.clone();
        settings.merge(update);
        validate_settings(&settings)?;
        Ok(settings)
    }
}

/// Platform family for `settings`; desktop unless one is configured.
#[must_use]
pub fn platform_kind(settings: &ReaderSettings) -> PlatformKind {
    settings.platform.unwrap_or_default()
}

/// Effective timer profile for `settings`.
#[must_use]
pub fn platform_profile(settings: &ReaderSettings) -> PlatformProfile {
    settings.profile(platform_kind(settings))
}

/// The speech platform commands run against.
#[must_use]
pub fn speech_platform(settings: &ReaderSettings) -> Arc<dyn SpeechPlatform> {
    Arc::new(SimulatedPlatform::new(platform_kind(settings)))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_path_uses_defaults() {
        let config = CliConfig::load(None).unwrap();
        assert_eq!(config.settings, ReaderSettings::default());
        assert!(config.source.is_none());
    }

    #[test]
    fn file_settings_fill_defaults() {
        let file = write_config(
            r#"{ "locale": "fr-FR", "platform": "android", "resilience": { "retry_delay_ms": 120 } }"#,
        );
        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.settings.locale, "fr-FR");
        assert_eq!(config.settings.platform, Some(PlatformKind::Android));
        assert_eq!(config.settings.max_retries, 2);
        assert_eq!(
            platform_profile(&config.settings).retry_delay,
            Duration::from_millis(120)
        );
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let err = CliConfig::load(Some(Path::new("/nonexistent/readaloud.json"))).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn malformed_file_is_config_error() {
        let file = write_config("{ rate: fast }");
        let err = CliConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn invalid_values_are_rejected_on_load() {
        let file = write_config(r#"{ "volume": 4.0 }"#);
        let err = CliConfig::load(Some(file.path())).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn flag_overrides_are_validated() {
        let config = CliConfig::default();
        let ok = config
            .settings_with(&SettingsUpdate {
                rate: Some(1.5),
                ..SettingsUpdate::default()
            })
            .unwrap();
        assert!((ok.rate - 1.5).abs() < f32::EPSILON);

        let err = config
            .settings_with(&SettingsUpdate {
                rate: Some(9.0),
                ..SettingsUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn profile_follows_configured_platform() {
        let settings = ReaderSettings {
            platform: Some(PlatformKind::Ios),
            ..ReaderSettings::default()
        };
        assert_eq!(platform_kind(&settings), PlatformKind::Ios);
        assert_eq!(
            platform_profile(&settings).early_detection,
            Some(Duration::from_millis(1200))
        );
        assert_eq!(speech_platform(&settings).kind(), PlatformKind::Ios);
    }
}
