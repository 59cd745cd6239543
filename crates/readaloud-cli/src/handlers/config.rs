//! Config command handler.

use std::io::Write;

use anyhow::Result;

use crate::bootstrap::{CliConfig, platform_kind, platform_profile};
use crate::commands::ConfigCommand;
use crate::presentation::format_duration;

/// Execute the config command.
pub fn execute(config: &CliConfig, command: &ConfigCommand, out: &mut impl Write) -> Result<()> {
    match command {
        ConfigCommand::Show => show_settings(config, out),
        ConfigCommand::Profile { overrides } => {
            let settings = config.settings_with(&overrides.to_update())?;
            show_profile(&settings, out)
        }
    }
}

fn show_settings(config: &CliConfig, out: &mut impl Write) -> Result<()> {
    match &config.source {
        Some(path) => writeln!(out, "# Loaded from {}", path.display())?,
        None => writeln!(out, "# Defaults (no --config given)")?,
    }
    writeln!(out, "{}", config.settings.to_json()?)?;
    Ok(())
}

fn show_profile(settings: &readaloud_core::ReaderSettings, out: &mut impl Write) -> Result<()> {
    let profile = platform_profile(settings);
    let early = profile
        .early_detection
        .map_or_else(|| "off".to_string(), format_duration);

    writeln!(out, "Timer profile for {}:", platform_kind(settings))?;
    writeln!(out, "  Backup buffer:         {}", format_duration(profile.backup_buffer))?;
    writeln!(out, "  Early detection:       {early}")?;
    writeln!(
        out,
        "  Inter-sentence delay:  {}",
        format_duration(profile.inter_sentence_delay)
    )?;
    writeln!(out, "  Retry delay:           {}", format_duration(profile.retry_delay))?;
    writeln!(out, "  Max retries:           {}", settings.max_retries)?;
    writeln!(
        out,
        "  Voice polling:         {} x {} (max {})",
        profile.voice_poll_attempts,
        format_duration(profile.voice_poll_interval),
        format_duration(profile.max_voice_poll_interval)
    )?;
    Ok(())
}
