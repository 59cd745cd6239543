//! Shared helpers for readaloud-engine integration tests.

// Each test binary uses a different subset.
#![allow(dead_code)]

pub mod platform;

use std::sync::Arc;

use readaloud_engine::{
    Reader, ReaderCallbacks, ReaderEvent, ReaderOptions, ReaderSettings, SpeechPlatform,
};
use tokio::sync::mpsc::UnboundedReceiver;

/// Three sentences: 800 ms, 1375 ms and 400 ms estimates at rate 1.0.
pub const ARTICLE: &str = "Hello world. This is a test. Done.";

/// Spawn a reader with default settings whose events go to a channel.
pub fn spawn_reader(platform: Arc<dyn SpeechPlatform>) -> (Reader, UnboundedReceiver<ReaderEvent>) {
    spawn_reader_with(platform, ReaderSettings::default())
}

pub fn spawn_reader_with(
    platform: Arc<dyn SpeechPlatform>,
    settings: ReaderSettings,
) -> (Reader, UnboundedReceiver<ReaderEvent>) {
    let (callbacks, rx) = ReaderCallbacks::channel();
    let reader = Reader::spawn(platform, ReaderOptions::new(settings, callbacks))
        .expect("default settings are valid");
    (reader, rx)
}

/// Drain all pending events from the receiver.
pub fn drain(rx: &mut UnboundedReceiver<ReaderEvent>) -> Vec<ReaderEvent> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}

/// Indices of every progress event, in order.
pub fn progress_indices(events: &[ReaderEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            ReaderEvent::Progress { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

/// Short labels for an event sequence (`"start"`, `"progress:0"`, ...).
pub fn labels(events: &[ReaderEvent]) -> Vec<String> {
    events
        .iter()
        .map(|e| match e {
            ReaderEvent::Started => "start".to_string(),
            ReaderEvent::Progress { index, .. } => format!("progress:{index}"),
            ReaderEvent::Completed => "complete".to_string(),
            ReaderEvent::Error(_) => "error".to_string(),
            ReaderEvent::Paused => "pause".to_string(),
            ReaderEvent::Resumed => "resume".to_string(),
        })
        .collect()
}
