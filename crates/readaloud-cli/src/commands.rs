//! Subcommands and their arguments.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use readaloud_core::{PlatformKind, SettingsUpdate};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Read a file (or stdin) aloud through the simulated platform
    Read(ReadArgs),

    /// Print the sentence units a text is split into
    Segment {
        /// Text file to segment ("-" or omitted reads stdin)
        file: Option<PathBuf>,
        /// Print units as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        overrides: SettingsOverrides,
    },

    /// List the platform's voices and the one that would be chosen
    Voices {
        #[command(flatten)]
        overrides: SettingsOverrides,
    },

    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `read`.
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Text file to read ("-" or omitted reads stdin)
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SettingsOverrides,
}

/// Per-invocation settings overrides shared by several commands.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Speech rate multiplier (1.0 = normal)
    #[arg(long)]
    pub rate: Option<f32>,

    /// Platform family whose timer defaults apply
    #[arg(long)]
    pub platform: Option<PlatformKind>,

    /// Preferred voice locale (e.g. en-US)
    #[arg(long)]
    pub locale: Option<String>,
}

impl SettingsOverrides {
    /// Convert the flags into a partial settings update.
    #[must_use]
    pub fn to_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            rate: self.rate,
            locale: self.locale.clone(),
            platform: self.platform.map(Some),
            ..SettingsUpdate::default()
        }
    }
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective settings as JSON
    Show,
    /// Print the timer profile for a platform family
    Profile {
        #[command(flatten)]
        overrides: SettingsOverrides,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_change_nothing() {
        let update = SettingsOverrides::default().to_update();
        assert!(update.rate.is_none());
        assert!(update.locale.is_none());
        assert!(update.platform.is_none());
    }

    #[test]
    fn platform_flag_forces_kind() {
        let overrides = SettingsOverrides {
            platform: Some(PlatformKind::Web),
            ..SettingsOverrides::default()
        };
        assert_eq!(overrides.to_update().platform, Some(Some(PlatformKind::Web)));
    }
}
