//! Public handle to a running reader engine.

use std::sync::Arc;

use readaloud_core::{PlaybackState, PlaybackStatus, ReaderSettings, SpeechPlatform, validate_settings};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::controller::{Command, Controller};
use crate::emitter::ReaderCallbacks;
use crate::error::ReaderError;

/// Commands buffered before `Reader` methods start waiting.
const COMMAND_BUFFER: usize = 32;

/// Everything needed to start an engine.
#[derive(Debug, Default)]
pub struct ReaderOptions {
    pub settings: ReaderSettings,
    pub callbacks: ReaderCallbacks,
}

impl ReaderOptions {
    #[must_use]
    pub fn new(settings: ReaderSettings, callbacks: ReaderCallbacks) -> Self {
        Self {
            settings,
            callbacks,
        }
    }
}

/// Owned handle to one reader engine.
///
/// Every method is acknowledged only after the controller has applied it,
/// so callbacks triggered by the command have already run when the call
/// returns. Dropping the handle stops playback and ends the controller
/// task.
#[derive(Debug)]
pub struct Reader {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<PlaybackStatus>,
    task: JoinHandle<()>,
}

impl Reader {
    /// Validate `options.settings` and start the controller task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        platform: Arc<dyn SpeechPlatform>,
        options: ReaderOptions,
    ) -> Result<Self, ReaderError> {
        validate_settings(&options.settings)?;

        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status) = watch::channel(PlaybackStatus::idle());
        let controller = Controller::new(
            platform,
            options.settings,
            options.callbacks,
            command_rx,
            status_tx,
        );
        let task = tokio::spawn(controller.run());
        debug!("Reader engine started");

        Ok(Self {
            commands,
            status,
            task,
        })
    }

    /// Start reading `text`, replacing any current session.
    ///
    /// Returns the number of sentences, or [`ReaderError::EmptyInput`] when
    /// there is nothing to read (no callbacks fire in that case).
    pub async fn play(&self, text: impl Into<String>) -> Result<usize, ReaderError> {
        let text = text.into();
        self.request(|reply| Command::Play { text, reply }).await?
    }

    /// Pause the current session. No-op unless playing.
    pub async fn pause(&self) -> Result<(), ReaderError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    /// Resume a paused session at the same sentence. No-op unless paused.
    pub async fn resume(&self) -> Result<(), ReaderError> {
        self.request(|reply| Command::Resume { reply }).await
    }

    /// Stop playback. No callback fires once this returns. Idempotent.
    pub async fn stop(&self) -> Result<(), ReaderError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Change the speech rate; returns the clamped rate actually applied.
    pub async fn set_speed(&self, rate: f32) -> Result<f32, ReaderError> {
        self.request(|reply| Command::SetSpeed { rate, reply }).await
    }

    /// Change the pitch for subsequent utterances (clamped to 0.0–2.0).
    pub async fn set_pitch(&self, pitch: f32) -> Result<f32, ReaderError> {
        self.request(|reply| Command::SetPitch { pitch, reply }).await
    }

    /// Change the volume for subsequent utterances (clamped to 0.0–1.0).
    pub async fn set_volume(&self, volume: f32) -> Result<f32, ReaderError> {
        self.request(|reply| Command::SetVolume { volume, reply }).await
    }

    /// Latest status snapshot.
    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        self.status.borrow().clone()
    }

    /// Receiver that observes every published status.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.clone()
    }

    /// Wait until the current session ends.
    ///
    /// `Ok(())` when it played to the end, [`ReaderError::UserCancelled`]
    /// when it was stopped (or there was no session).
    pub async fn wait(&self) -> Result<(), ReaderError> {
        let mut status = self.status.clone();
        loop {
            let state = status.borrow_and_update().state;
            match state {
                PlaybackState::Completed => return Ok(()),
                PlaybackState::Idle => return Err(ReaderError::UserCancelled),
                PlaybackState::Playing | PlaybackState::Paused => {
                    status
                        .changed()
                        .await
                        .map_err(|_| ReaderError::EngineClosed)?;
                }
            }
        }
    }

    /// Stop playback and wait for the controller task to exit.
    pub async fn shutdown(self) {
        let _ = self.stop().await;
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            debug!(error = %e, "Reader controller task ended abnormally");
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ReaderError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| ReaderError::EngineClosed)?;
        rx.await.map_err(|_| ReaderError::EngineClosed)
    }
}
