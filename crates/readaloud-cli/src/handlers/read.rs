//! Read command handler.
//!
//! Plays a text through the reader engine, printing each sentence when its
//! progress event arrives. Resolves when the session completes or when the
//! `stop` future fires (Ctrl-C in the binary).

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use readaloud_core::{ReaderSettings, SettingsUpdate};
use readaloud_engine::{Reader, ReaderCallbacks, ReaderEvent, ReaderOptions, SpeechPlatform};
use tracing::{debug, info};

use crate::bootstrap::{CliConfig, speech_platform};
use crate::error::CliError;
use crate::presentation::format_duration;

/// What happened during one `read` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSummary {
    /// Sentences in the session.
    pub total: usize,
    /// Sentences announced by a progress event.
    pub announced: usize,
    /// Sentences skipped after platform failures.
    pub skipped: usize,
    /// Whether the session played to the end.
    pub completed: bool,
}

/// Execute the read command against the configured platform.
pub async fn execute(
    config: &CliConfig,
    update: &SettingsUpdate,
    text: &str,
    stop: impl Future<Output = ()>,
    out: &mut impl Write,
) -> Result<ReadSummary> {
    let settings = config.settings_with(update)?;
    let platform = speech_platform(&settings);
    read_with(platform, settings, text, stop, out).await
}

/// Read `text` on `platform` until completion or `stop`.
pub async fn read_with(
    platform: Arc<dyn SpeechPlatform>,
    settings: ReaderSettings,
    text: &str,
    stop: impl Future<Output = ()>,
    out: &mut impl Write,
) -> Result<ReadSummary> {
    let (callbacks, mut events) = ReaderCallbacks::channel();
    let reader = Reader::spawn(platform, ReaderOptions::new(settings, callbacks))
        .map_err(CliError::from)?;
    let total = reader.play(text).await.map_err(CliError::from)?;
    info!(total, "Reading");

    let mut summary = ReadSummary {
        total,
        ..ReadSummary::default()
    };
    tokio::pin!(stop);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    ReaderEvent::Progress { index, total, text, meta } => {
                        summary.announced += 1;
                        debug!(index, budget = %format_duration(meta.estimated_duration), "Sentence announced");
                        writeln!(out, "[{}/{total}] {text}", index + 1)?;
                    }
                    ReaderEvent::Error(error) => {
                        summary.skipped += 1;
                        writeln!(out, "  ! {error}")?;
                    }
                    ReaderEvent::Completed => {
                        summary.completed = true;
                        break;
                    }
                    ReaderEvent::Started | ReaderEvent::Paused | ReaderEvent::Resumed => {}
                }
            }
            () = &mut stop => {
                reader.stop().await.map_err(CliError::from)?;
                info!("Reading stopped by user");
                break;
            }
        }
    }

    reader.shutdown().await;

    if summary.completed {
        writeln!(
            out,
            "Done: {} sentence(s), {} skipped.",
            summary.total, summary.skipped
        )?;
    } else {
        writeln!(out, "Stopped after {} of {} sentence(s).", summary.announced, summary.total)?;
    }
    Ok(summary)
}
