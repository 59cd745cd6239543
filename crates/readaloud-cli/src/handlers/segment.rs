//! Segment command handler.
//!
//! Shows how a text will be split and how long each sentence is budgeted
//! for, without speaking anything.

use std::io::Write;

use anyhow::{Context, Result};
use readaloud_core::SettingsUpdate;
use readaloud_engine::{Segmenter, SegmenterConfig, SentenceUnit};

use crate::bootstrap::CliConfig;
use crate::presentation::{format_duration, truncate_string, write_separator};

/// Execute the segment command.
///
/// Prints a table (or a JSON array with `json`) of the sentence units
/// `text` produces at the effective rate.
pub fn execute(
    config: &CliConfig,
    update: &SettingsUpdate,
    text: &str,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let settings = config.settings_with(update)?;
    let units = Segmenter::new(SegmenterConfig::from(&settings)).segment(text, settings.rate);

    if json {
        let rendered =
            serde_json::to_string_pretty(&units).context("Failed to serialize sentences")?;
        writeln!(out, "{rendered}")?;
        return Ok(());
    }

    write_table(&units, out)?;
    Ok(())
}

fn write_table(units: &[SentenceUnit], out: &mut impl Write) -> std::io::Result<()> {
    if units.is_empty() {
        writeln!(out, "No sentences found.")?;
        return Ok(());
    }

    writeln!(out, "{:<4} {:<6} {:<8} Text", "#", "Words", "Budget")?;
    write_separator(out, 72)?;
    for unit in units {
        writeln!(
            out,
            "{:<4} {:<6} {:<8} {}",
            unit.index,
            unit.word_count,
            format_duration(unit.estimated_duration),
            truncate_string(&unit.text, 52)
        )?;
    }
    writeln!(out, "\n{} sentence(s)", units.len())
}
