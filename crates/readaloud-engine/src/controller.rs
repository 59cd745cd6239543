//! Playback controller actor.
//!
//! All state lives on one task. Commands from the [`Reader`](crate::Reader)
//! handle and signals from the platform, the watchdogs, and the voice
//! resolver are serialized through [`Controller::run`], so transitions never
//! interleave.
//!
//! Every deferred signal carries the [`AttemptId`] it was armed for and is
//! dropped unless that id is still the live one. Superseding an attempt
//! also cancels its token, which stops any timers that have not yet fired.

use std::sync::Arc;

use readaloud_core::{
    AttemptId, PlatformCapabilities, PlatformError, PlatformErrorCode, PlatformProfile,
    PlaybackState, PlaybackStatus, ReaderSettings, SentenceUnit, SpeechPlatform, Utterance,
    UtteranceEvent, UtteranceSink, VoiceDescriptor, progress_percent,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::emitter::{EventEmitter, ProgressMeta, ReaderCallbacks};
use crate::error::ReaderError;
use crate::resilience::{AttemptCounter, FailureAction, RetryPolicy, TimerKind, Watchdog};
use crate::segmenter::{Segmenter, SegmenterConfig};
use crate::voice::VoiceResolver;

/// Requests from the [`Reader`](crate::Reader) handle.
#[derive(Debug)]
pub(crate) enum Command {
    Play {
        text: String,
        reply: oneshot::Sender<Result<usize, ReaderError>>,
    },
    Pause {
        reply: oneshot::Sender<()>,
    },
    Resume {
        reply: oneshot::Sender<()>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    SetSpeed {
        rate: f32,
        reply: oneshot::Sender<f32>,
    },
    SetPitch {
        pitch: f32,
        reply: oneshot::Sender<f32>,
    },
    SetVolume {
        volume: f32,
        reply: oneshot::Sender<f32>,
    },
}

/// Deferred inputs produced off the controller task.
#[derive(Debug)]
enum Signal {
    Utterance {
        attempt: AttemptId,
        event: UtteranceEvent,
    },
    Timer {
        attempt: AttemptId,
        kind: TimerKind,
    },
    VoiceResolved(Option<VoiceDescriptor>),
}

#[derive(Debug)]
enum VoiceSlot {
    Unresolved,
    Resolving,
    Resolved(Option<VoiceDescriptor>),
}

/// What the live attempt is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for the first voice resolution to finish.
    AwaitingVoice,
    /// Utterance submitted; `started` once the platform reported it.
    Speaking { started: bool },
    /// Paused in place on the platform. `finished` if the end event
    /// arrived while held.
    Held { finished: bool },
    /// Next submission armed as a `Step` timer.
    Scheduled,
    /// Nothing in flight; the current sentence is re-issued on resume.
    Parked,
}

/// The single live attempt of a session.
#[derive(Debug)]
struct Live {
    id: AttemptId,
    token: CancellationToken,
    phase: Phase,
}

impl Live {
    fn new(id: AttemptId, phase: Phase) -> Self {
        Self {
            id,
            token: CancellationToken::new(),
            phase,
        }
    }

    /// Replace this attempt with `id`, cancelling the old attempt's timers.
    fn supersede(&mut self, id: AttemptId, phase: Phase) -> CancellationToken {
        self.token.cancel();
        *self = Self::new(id, phase);
        self.token.clone()
    }

    /// Cancel timers but keep the attempt id, so platform events for the
    /// same utterance still count.
    fn rearm(&mut self, phase: Phase) -> CancellationToken {
        self.token.cancel();
        self.token = CancellationToken::new();
        self.phase = phase;
        self.token.clone()
    }
}

#[derive(Debug)]
struct Session {
    sentences: Vec<SentenceUnit>,
    index: usize,
    retry: u32,
    paused: bool,
    /// Highest index whose progress event has been emitted.
    announced: Option<usize>,
    live: Live,
}

impl Session {
    fn total(&self) -> usize {
        self.sentences.len()
    }

    fn is_done(&self) -> bool {
        self.index >= self.sentences.len()
    }
}

pub(crate) struct Controller {
    platform: Arc<dyn SpeechPlatform>,
    capabilities: PlatformCapabilities,
    settings: ReaderSettings,
    profile: PlatformProfile,
    segmenter: Segmenter,
    policy: RetryPolicy,
    attempts: AttemptCounter,
    watchdog: Watchdog,
    emitter: EventEmitter,
    voice: VoiceSlot,
    session: Option<Session>,
    /// Sentence count of the last session that played to the end.
    finished: Option<usize>,
    status: watch::Sender<PlaybackStatus>,
    commands: mpsc::Receiver<Command>,
    signal_tx: mpsc::UnboundedSender<Signal>,
    signal_rx: mpsc::UnboundedReceiver<Signal>,
}

impl Controller {
    pub(crate) fn new(
        platform: Arc<dyn SpeechPlatform>,
        settings: ReaderSettings,
        callbacks: ReaderCallbacks,
        commands: mpsc::Receiver<Command>,
        status: watch::Sender<PlaybackStatus>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let profile = settings.profile(platform.kind());
        let capabilities = platform.capabilities();

        let watchdog = {
            let tx = signal_tx.clone();
            Watchdog::new(move |attempt, kind| {
                let _ = tx.send(Signal::Timer { attempt, kind });
            })
        };

        debug!(
            platform = %platform.kind(),
            ?profile,
            ?capabilities,
            "Reader controller created"
        );

        Self {
            capabilities,
            segmenter: Segmenter::new(SegmenterConfig::from(&settings)),
            policy: RetryPolicy::new(settings.max_retries),
            profile,
            settings,
            platform,
            attempts: AttemptCounter::new(),
            watchdog,
            emitter: EventEmitter::new(callbacks),
            voice: VoiceSlot::Unresolved,
            session: None,
            finished: None,
            status,
            commands,
            signal_tx,
            signal_rx,
        }
    }

    /// Process commands and signals until every handle is dropped.
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(signal) = self.signal_rx.recv() => {
                    self.handle_signal(signal);
                    self.publish();
                }
            }
        }

        self.stop();
        debug!("Reader controller exited");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play { text, reply } => {
                let result = self.play(&text);
                self.publish();
                let _ = reply.send(result);
            }
            Command::Pause { reply } => {
                self.pause();
                self.publish();
                let _ = reply.send(());
            }
            Command::Resume { reply } => {
                self.resume();
                self.publish();
                let _ = reply.send(());
            }
            Command::Stop { reply } => {
                self.stop();
                self.publish();
                let _ = reply.send(());
            }
            Command::SetSpeed { rate, reply } => {
                let applied = self.set_speed(rate);
                self.publish();
                let _ = reply.send(applied);
            }
            Command::SetPitch { pitch, reply } => {
                if !pitch.is_nan() {
                    self.settings.pitch = pitch.clamp(0.0, 2.0);
                }
                let _ = reply.send(self.settings.pitch);
            }
            Command::SetVolume { volume, reply } => {
                if !volume.is_nan() {
                    self.settings.volume = volume.clamp(0.0, 1.0);
                }
                let _ = reply.send(self.settings.volume);
            }
        }
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::VoiceResolved(voice) => {
                self.voice = VoiceSlot::Resolved(voice);
                if self.phase() == Some(Phase::AwaitingVoice) {
                    self.speak_current();
                }
            }
            Signal::Utterance { attempt, event } => {
                if !self.is_live(attempt) {
                    trace!(%attempt, ?event, "Dropping event from superseded attempt");
                    return;
                }
                match event {
                    UtteranceEvent::Started => self.on_started(),
                    UtteranceEvent::Ended => self.on_ended(),
                    UtteranceEvent::Failed(error) => self.on_failed(error),
                }
            }
            Signal::Timer { attempt, kind } => {
                if !self.is_live(attempt) {
                    trace!(%attempt, %kind, "Dropping timer from superseded attempt");
                    return;
                }
                match kind {
                    TimerKind::Backup => self.on_backup(),
                    TimerKind::EarlyDetection => self.on_early_detection(),
                    TimerKind::Step => {
                        if self.phase() == Some(Phase::Scheduled) {
                            self.speak_current();
                        }
                    }
                }
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────────────

    fn play(&mut self, text: &str) -> Result<usize, ReaderError> {
        self.stop();

        let sentences = self.segmenter.segment(text, self.settings.rate);
        if sentences.is_empty() {
            debug!("Nothing to read");
            return Err(ReaderError::EmptyInput);
        }

        let total = sentences.len();
        self.session = Some(Session {
            sentences,
            index: 0,
            retry: 0,
            paused: false,
            announced: None,
            live: Live::new(self.attempts.mint(), Phase::Parked),
        });

        self.emitter.start(total);
        self.speak_current();
        Ok(total)
    }

    fn pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.paused {
            return;
        }
        session.paused = true;

        match session.live.phase {
            Phase::Speaking { .. } if self.capabilities.can_pause && self.platform.pause() => {
                session.live.rearm(Phase::Held { finished: false });
                debug!(index = session.index, attempt = %session.live.id, "Paused in place");
            }
            Phase::Speaking { .. } => {
                self.platform.cancel();
                session.live.supersede(self.attempts.mint(), Phase::Parked);
                debug!(index = session.index, "Pause unsupported, utterance cancelled");
            }
            _ => {
                session.live.supersede(self.attempts.mint(), Phase::Parked);
            }
        }

        self.emitter.pause();
    }

    fn resume(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.paused {
            return;
        }
        session.paused = false;
        let phase = session.live.phase;
        self.emitter.resume();

        match phase {
            Phase::Held { finished: true } => self.sentence_finished(),
            Phase::Held { finished: false }
                if self.capabilities.can_resume && self.platform.resume() =>
            {
                let budget = session.sentences[session.index].duration_at(self.settings.rate)
                    + self.profile.backup_buffer;
                let token = session.live.rearm(Phase::Speaking { started: true });
                self.watchdog
                    .arm(&token, session.live.id, TimerKind::Backup, budget);
                debug!(index = session.index, attempt = %session.live.id, "Resumed in place");
            }
            Phase::Held { .. } => {
                self.platform.cancel();
                self.speak_current();
            }
            _ => self.speak_current(),
        }
    }

    pub(crate) fn stop(&mut self) {
        self.finished = None;
        if let Some(session) = self.session.take() {
            session.live.token.cancel();
            self.platform.cancel();
            info!(
                index = session.index,
                total = session.total(),
                "Reading stopped"
            );
        }
    }

    fn set_speed(&mut self, rate: f32) -> f32 {
        let rate = self.settings.clamp_rate(rate);
        self.settings.rate = rate;

        match self.phase() {
            Some(Phase::Speaking { .. }) => {
                debug!(rate, "Re-issuing current sentence at new rate");
                self.platform.cancel();
                self.speak_current();
            }
            Some(Phase::Held { finished: false }) => {
                // Resume would continue at the old rate; re-issue instead.
                self.platform.cancel();
                if let Some(session) = self.session.as_mut() {
                    session.live.supersede(self.attempts.mint(), Phase::Parked);
                }
            }
            _ => {}
        }

        rate
    }

    // ── Sentence loop ────────────────────────────────────────────────────

    /// Submit the current sentence under a fresh attempt.
    fn speak_current(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.paused {
            return;
        }
        if session.is_done() {
            self.complete();
            return;
        }

        let VoiceSlot::Resolved(voice) = &self.voice else {
            session
                .live
                .supersede(self.attempts.mint(), Phase::AwaitingVoice);
            self.start_voice_resolution();
            return;
        };
        let voice = voice.clone();

        if self.platform.is_speaking() || self.platform.is_pending() {
            self.platform.cancel();
        }

        let attempt = self.attempts.mint();
        let token = session
            .live
            .supersede(attempt, Phase::Speaking { started: false });

        let index = session.index;
        let total = session.total();
        let unit = &session.sentences[index];
        let budget = unit.duration_at(self.settings.rate);

        if session.announced.is_none_or(|announced| announced < index) {
            session.announced = Some(index);
            let meta = ProgressMeta {
                word_count: unit.word_count,
                estimated_duration: budget,
                progress_percent: progress_percent(index, total),
                attempt,
            };
            self.emitter.progress(index, total, &unit.text, &meta);
        }

        let utterance = Utterance {
            attempt,
            index,
            text: unit.text.clone(),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            volume: self.settings.volume,
            voice,
        };
        debug!(index, %attempt, retry = session.retry, ?budget, "Submitting sentence");

        if let Err(error) = self.platform.speak(utterance, self.sink(attempt)) {
            debug!(index, %attempt, %error, "Platform rejected utterance");
            self.on_failed(error);
            return;
        }

        self.watchdog.arm(
            &token,
            attempt,
            TimerKind::Backup,
            budget + self.profile.backup_buffer,
        );
        if let Some(window) = self.profile.early_detection {
            self.watchdog
                .arm(&token, attempt, TimerKind::EarlyDetection, window);
        }
    }

    fn start_voice_resolution(&mut self) {
        if !matches!(self.voice, VoiceSlot::Unresolved) {
            return;
        }
        self.voice = VoiceSlot::Resolving;

        let resolver = VoiceResolver::new(self.settings.locale.clone(), &self.profile);
        let platform = Arc::clone(&self.platform);
        let tx = self.signal_tx.clone();
        debug!(locale = %resolver.locale(), "Resolving voice");

        tokio::spawn(async move {
            let voice = resolver.resolve(platform.as_ref()).await;
            let _ = tx.send(Signal::VoiceResolved(voice));
        });
    }

    /// Schedule the current sentence after `delay` under a fresh attempt.
    fn schedule(&mut self, delay: std::time::Duration) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let attempt = self.attempts.mint();
        let token = session.live.supersede(attempt, Phase::Scheduled);
        self.watchdog.arm(&token, attempt, TimerKind::Step, delay);
    }

    fn sentence_finished(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        debug!(index = session.index, attempt = %session.live.id, "Sentence finished");
        session.retry = 0;
        session.index += 1;

        if session.is_done() {
            self.complete();
        } else {
            self.schedule(self.profile.inter_sentence_delay);
        }
    }

    fn complete(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.live.token.cancel();
        let total = session.total();
        self.finished = Some(total);
        self.emitter.complete(total);
    }

    // ── Signal handlers (attempt already verified live) ──────────────────

    fn on_started(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Phase::Speaking { started } = &mut session.live.phase {
                *started = true;
                trace!(index = session.index, attempt = %session.live.id, "Platform started speaking");
            }
        }
    }

    fn on_ended(&mut self) {
        match self.phase() {
            Some(Phase::Speaking { .. }) => self.sentence_finished(),
            Some(Phase::Held { .. }) => {
                if let Some(session) = self.session.as_mut() {
                    session.live.phase = Phase::Held { finished: true };
                }
            }
            _ => {}
        }
    }

    fn on_backup(&mut self) {
        if let Some(Phase::Speaking { .. }) = self.phase() {
            debug!("Backup timer fired before end event, advancing");
            self.sentence_finished();
        }
    }

    fn on_early_detection(&mut self) {
        if self.phase() == Some(Phase::Speaking { started: false }) && !self.platform.is_speaking()
        {
            self.on_failed(PlatformError::new(PlatformErrorCode::SilentStart));
        }
    }

    fn on_failed(&mut self, error: PlatformError) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.live.phase {
            Phase::Speaking { .. } => {}
            Phase::Held { .. } => {
                // Held utterance died; resume re-issues it.
                debug!(index = session.index, %error, "Held utterance failed");
                session.live.supersede(self.attempts.mint(), Phase::Parked);
                return;
            }
            _ => return,
        }

        let index = session.index;
        match self.policy.decide(&error, session.retry) {
            FailureAction::Retry { retry } => {
                session.retry = retry;
                let code = error.code.to_string();
                let transient = ReaderError::TransientPlatform {
                    index,
                    retry,
                    source: error,
                };
                warn!(index, retry, %code, "{transient}");
                self.platform.cancel();
                self.schedule(self.profile.retry_delay);
            }
            FailureAction::Skip { attempts } => {
                session.retry = 0;
                session.index += 1;
                let done = session.is_done();

                self.emitter.error(&ReaderError::FatalPlatform {
                    index,
                    attempts,
                    source: error,
                });

                if done {
                    self.complete();
                } else {
                    self.schedule(self.profile.inter_sentence_delay);
                }
            }
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn sink(&self, attempt: AttemptId) -> UtteranceSink {
        let tx = self.signal_tx.clone();
        UtteranceSink::new(attempt, move |attempt, event| {
            let _ = tx.send(Signal::Utterance { attempt, event });
        })
    }

    fn is_live(&self, attempt: AttemptId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.live.id == attempt)
    }

    fn phase(&self) -> Option<Phase> {
        self.session.as_ref().map(|session| session.live.phase)
    }

    fn snapshot(&self) -> PlaybackStatus {
        match (&self.session, self.finished) {
            (Some(session), _) => {
                let total = session.total();
                let state = if session.paused {
                    PlaybackState::Paused
                } else {
                    PlaybackState::Playing
                };
                PlaybackStatus {
                    state,
                    is_active: true,
                    is_playing: !session.paused,
                    is_paused: session.paused,
                    current_index: session.index.min(total.saturating_sub(1)),
                    total_sentences: total,
                    progress_percent: progress_percent(session.index, total),
                    retry_count: session.retry,
                }
            }
            (None, Some(total)) => PlaybackStatus::completed(total),
            (None, None) => PlaybackStatus::idle(),
        }
    }

    fn publish(&self) {
        self.status.send_replace(self.snapshot());
    }
}
