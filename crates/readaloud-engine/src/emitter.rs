//! Event dispatch to the UI collaborator.
//!
//! Callbacks run synchronously on the controller task, in transition
//! order. Nothing is queued: a callback registered as `None` is simply
//! skipped.

use std::fmt;
use std::time::Duration;

use readaloud_core::AttemptId;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::ReaderError;

/// Extra information attached to every progress event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMeta {
    /// Words in the sentence.
    pub word_count: usize,
    /// Watchdog budget for the sentence at the current rate.
    #[serde(serialize_with = "serialize_millis")]
    pub estimated_duration: Duration,
    /// Share of the session reached when this sentence starts (0–100).
    pub progress_percent: f32,
    /// Attempt that announced the sentence.
    #[serde(skip)]
    pub attempt: AttemptId,
}

#[allow(clippy::cast_possible_truncation)]
fn serialize_millis<S: serde::Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(value.as_millis() as u64)
}

/// One callback invocation, as forwarded by [`ReaderCallbacks::channel`].
#[derive(Debug, Clone)]
pub enum ReaderEvent {
    Started,
    Progress {
        index: usize,
        total: usize,
        text: String,
        meta: ProgressMeta,
    },
    Completed,
    Error(ReaderError),
    Paused,
    Resumed,
}

type Notify = Box<dyn FnMut() + Send>;
type OnProgress = Box<dyn FnMut(usize, usize, &str, &ProgressMeta) + Send>;
type OnError = Box<dyn FnMut(&ReaderError) + Send>;

/// UI callbacks, registered through a builder.
///
/// ```
/// use readaloud_engine::ReaderCallbacks;
///
/// let callbacks = ReaderCallbacks::new()
///     .on_progress(|index, total, text, _meta| println!("[{}/{total}] {text}", index + 1))
///     .on_complete(|| println!("done"));
/// # drop(callbacks);
/// ```
#[derive(Default)]
pub struct ReaderCallbacks {
    on_start: Option<Notify>,
    on_progress: Option<OnProgress>,
    on_complete: Option<Notify>,
    on_error: Option<OnError>,
    on_pause: Option<Notify>,
    on_resume: Option<Notify>,
}

impl ReaderCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once when a session starts.
    #[must_use]
    pub fn on_start(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Called once per sentence with `(index, total, text, meta)`.
    #[must_use]
    pub fn on_progress(
        mut self,
        f: impl FnMut(usize, usize, &str, &ProgressMeta) + Send + 'static,
    ) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Called once when the last sentence has finished.
    #[must_use]
    pub fn on_complete(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Called when a sentence is skipped.
    #[must_use]
    pub fn on_error(mut self, f: impl FnMut(&ReaderError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_pause(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_pause = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_resume(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_resume = Some(Box::new(f));
        self
    }

    /// Callbacks that forward every event into an unbounded channel.
    ///
    /// Events sent after the receiver is dropped are discarded.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ReaderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let forward = |event: fn() -> ReaderEvent| {
            let tx = tx.clone();
            move || {
                let _ = tx.send(event());
            }
        };

        let callbacks = Self::new()
            .on_start(forward(|| ReaderEvent::Started))
            .on_complete(forward(|| ReaderEvent::Completed))
            .on_pause(forward(|| ReaderEvent::Paused))
            .on_resume(forward(|| ReaderEvent::Resumed))
            .on_progress({
                let tx = tx.clone();
                move |index, total, text, meta| {
                    let _ = tx.send(ReaderEvent::Progress {
                        index,
                        total,
                        text: text.to_string(),
                        meta: meta.clone(),
                    });
                }
            })
            .on_error(move |error| {
                let _ = tx.send(ReaderEvent::Error(error.clone()));
            });

        (callbacks, rx)
    }
}

impl fmt::Debug for ReaderCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_pause", &self.on_pause.is_some())
            .field("on_resume", &self.on_resume.is_some())
            .finish()
    }
}

/// Dispatches events to registered callbacks, logging each one.
pub(crate) struct EventEmitter {
    callbacks: ReaderCallbacks,
}

impl EventEmitter {
    pub(crate) const fn new(callbacks: ReaderCallbacks) -> Self {
        Self { callbacks }
    }

    pub(crate) fn start(&mut self, total: usize) {
        info!(total, "Reading started");
        if let Some(f) = self.callbacks.on_start.as_mut() {
            f();
        }
    }

    pub(crate) fn progress(&mut self, index: usize, total: usize, text: &str, meta: &ProgressMeta) {
        debug!(index, total, attempt = %meta.attempt, "Sentence progress");
        if let Some(f) = self.callbacks.on_progress.as_mut() {
            f(index, total, text, meta);
        }
    }

    pub(crate) fn complete(&mut self, total: usize) {
        info!(total, "Reading completed");
        if let Some(f) = self.callbacks.on_complete.as_mut() {
            f();
        }
    }

    pub(crate) fn error(&mut self, error: &ReaderError) {
        warn!(%error, "Reader error");
        if let Some(f) = self.callbacks.on_error.as_mut() {
            f(error);
        }
    }

    pub(crate) fn pause(&mut self) {
        debug!("Reading paused");
        if let Some(f) = self.callbacks.on_pause.as_mut() {
            f();
        }
    }

    pub(crate) fn resume(&mut self) {
        debug!("Reading resumed");
        if let Some(f) = self.callbacks.on_resume.as_mut() {
            f();
        }
    }
}
