//! Voices command handler.
//!
//! Runs the same resolution the engine performs on first playback and
//! lists the platform catalogue with the chosen voice marked.

use std::io::Write;

use anyhow::Result;
use readaloud_core::SettingsUpdate;
use readaloud_engine::{VoiceDescriptor, VoiceResolver};

use crate::bootstrap::{CliConfig, platform_kind, platform_profile, speech_platform};
use crate::presentation::{truncate_string, write_separator};

/// Execute the voices command.
pub async fn execute(
    config: &CliConfig,
    update: &SettingsUpdate,
    out: &mut impl Write,
) -> Result<Option<VoiceDescriptor>> {
    let settings = config.settings_with(update)?;
    let platform = speech_platform(&settings);
    let resolver = VoiceResolver::new(settings.locale.clone(), &platform_profile(&settings));

    let chosen = resolver.resolve(platform.as_ref()).await;
    let voices = if chosen.is_some() {
        platform.voices().await
    } else {
        Vec::new()
    };

    writeln!(
        out,
        "Platform: {}   Preferred locale: {}",
        platform_kind(&settings),
        resolver.locale()
    )?;
    write_catalogue(&voices, chosen.as_ref(), out)?;
    Ok(chosen)
}

fn write_catalogue(
    voices: &[VoiceDescriptor],
    chosen: Option<&VoiceDescriptor>,
    out: &mut impl Write,
) -> std::io::Result<()> {
    if voices.is_empty() {
        writeln!(out, "No voices available; the platform default voice will be used.")?;
        return Ok(());
    }

    writeln!(out, "  {:<20} {:<8} {:<5} Default", "Name", "Locale", "Rank")?;
    write_separator(out, 48)?;
    for voice in voices {
        let marker = if chosen == Some(voice) { '*' } else { ' ' };
        writeln!(
            out,
            "{marker} {:<20} {:<8} {:<5} {}",
            truncate_string(&voice.name, 20),
            voice.lang,
            voice.platform_preference_rank,
            if voice.is_default { "yes" } else { "" }
        )?;
    }
    Ok(())
}
