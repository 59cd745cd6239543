//! Simulated speech platform.
//!
//! Speaks nothing, but reproduces the lifecycle behaviour of real platform
//! engines on tokio time: start latency, duration proportional to text
//! length and rate, pause/resume, `canceled` on cancel, and a voice list
//! that can populate late. Per-sentence scripts inject the failure modes
//! the controller must survive.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use readaloud_core::{
    AttemptId, PlatformCapabilities, PlatformError, PlatformErrorCode, PlatformKind,
    SpeechPlatform, Utterance, UtteranceSink, VoiceDescriptor,
};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// How the platform handles one submitted utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Start, speak for the full duration, end.
    Speak,
    /// Fail with `code` instead of starting.
    Fail(PlatformErrorCode),
    /// Accept the utterance and never report anything.
    Silent,
    /// Start and speak, but never deliver the end event.
    Lost,
    /// Start and speak, delivering the end event this much late.
    LateEnd(Duration),
    /// Reject the utterance synchronously from `speak()`.
    Reject(PlatformErrorCode),
}

/// Simulated speaking speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechTiming {
    /// Delay between `speak()` and the start event.
    pub start_latency: Duration,
    /// Speaking time per character at rate 1.0.
    pub per_char: Duration,
}

impl Default for SpeechTiming {
    fn default() -> Self {
        Self {
            start_latency: Duration::from_millis(50),
            per_char: Duration::from_millis(40),
        }
    }
}

impl SpeechTiming {
    /// Time to speak `text` at `rate`.
    #[must_use]
    pub fn duration(&self, text: &str, rate: f32) -> Duration {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        let base = self.per_char.saturating_mul(chars);
        if rate <= 0.0 {
            return base;
        }
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let nanos = (base.as_nanos() as f64 / f64::from(rate)).round() as u64;
        Duration::from_nanos(nanos)
    }
}

struct Current {
    attempt: AttemptId,
    cancel: CancellationToken,
    sink: UtteranceSink,
    speaking: bool,
}

#[derive(Default)]
struct State {
    scripts: HashMap<usize, VecDeque<Outcome>>,
    current: Option<Current>,
    spoken: Vec<Utterance>,
    cancels: usize,
    voice_polls: u32,
}

/// In-process [`SpeechPlatform`] driven by tokio timers.
pub struct SimulatedPlatform {
    kind: PlatformKind,
    capabilities: PlatformCapabilities,
    timing: SpeechTiming,
    voices: Vec<VoiceDescriptor>,
    voices_ready_after: u32,
    state: Arc<Mutex<State>>,
    paused: watch::Sender<bool>,
}

impl SimulatedPlatform {
    /// A platform of `kind` with pause support and a small voice catalogue.
    ///
    /// iOS-flavoured platforms report an empty voice list for the first
    /// two polls.
    #[must_use]
    pub fn new(kind: PlatformKind) -> Self {
        let voices_ready_after = if kind == PlatformKind::Ios { 2 } else { 0 };
        Self {
            kind,
            capabilities: PlatformCapabilities::full(),
            timing: SpeechTiming::default(),
            voices: default_voices(),
            voices_ready_after,
            state: Arc::new(Mutex::new(State::default())),
            paused: watch::channel(false).0,
        }
    }

    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: PlatformCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    #[must_use]
    pub const fn with_timing(mut self, timing: SpeechTiming) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn with_voices(mut self, voices: Vec<VoiceDescriptor>) -> Self {
        self.voices = voices;
        self
    }

    /// Report an empty voice list for the first `polls` calls.
    #[must_use]
    pub const fn voices_ready_after(mut self, polls: u32) -> Self {
        self.voices_ready_after = polls;
        self
    }

    /// Queue outcomes for successive attempts at sentence `index`. Once the
    /// queue is drained the sentence speaks normally.
    #[must_use]
    pub fn script(self, index: usize, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        self.lock()
            .scripts
            .entry(index)
            .or_default()
            .extend(outcomes);
        self
    }

    /// Every utterance submitted so far, in order.
    #[must_use]
    pub fn spoken(&self) -> Vec<Utterance> {
        self.lock().spoken.clone()
    }

    /// Number of `cancel()` calls.
    #[must_use]
    pub fn cancel_count(&self) -> usize {
        self.lock().cancels
    }

    /// Number of `voices()` calls.
    #[must_use]
    pub fn voice_polls(&self) -> u32 {
        self.lock().voice_polls
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SimulatedPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedPlatform")
            .field("kind", &self.kind)
            .field("capabilities", &self.capabilities)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SpeechPlatform for SimulatedPlatform {
    fn kind(&self) -> PlatformKind {
        self.kind
    }

    fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    async fn voices(&self) -> Vec<VoiceDescriptor> {
        let mut state = self.lock();
        state.voice_polls += 1;
        if state.voice_polls > self.voices_ready_after {
            self.voices.clone()
        } else {
            Vec::new()
        }
    }

    fn speak(&self, utterance: Utterance, sink: UtteranceSink) -> Result<(), PlatformError> {
        let (outcome, displaced) = {
            let mut state = self.lock();
            state.spoken.push(utterance.clone());
            let outcome = state
                .scripts
                .get_mut(&utterance.index)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Outcome::Speak);

            if let Outcome::Reject(code) = outcome {
                return Err(PlatformError::with_detail(code, "rejected by simulator"));
            }

            let cancel = CancellationToken::new();
            let displaced = state.current.replace(Current {
                attempt: utterance.attempt,
                cancel: cancel.clone(),
                sink: sink.clone(),
                speaking: false,
            });
            tokio::spawn(perform(
                Arc::clone(&self.state),
                self.paused.subscribe(),
                cancel,
                sink,
                outcome.clone(),
                self.timing.start_latency,
                self.timing.duration(&utterance.text, utterance.rate),
            ));
            (outcome, displaced)
        };

        // A new utterance replaces anything the caller left behind.
        if let Some(old) = displaced {
            old.cancel.cancel();
            old.sink.failed(PlatformErrorCode::Interrupted);
        }
        trace!(attempt = %utterance.attempt, index = utterance.index, ?outcome, "Simulated speak");
        Ok(())
    }

    fn cancel(&self) {
        let current = {
            let mut state = self.lock();
            state.cancels += 1;
            state.current.take()
        };
        self.paused.send_replace(false);

        if let Some(current) = current {
            current.cancel.cancel();
            current.sink.failed(PlatformErrorCode::Canceled);
        }
    }

    fn pause(&self) -> bool {
        if !self.capabilities.can_pause {
            return false;
        }
        self.paused.send_replace(true);
        true
    }

    fn resume(&self) -> bool {
        if !self.capabilities.can_resume {
            return false;
        }
        self.paused.send_replace(false);
        true
    }

    fn is_speaking(&self) -> bool {
        self.lock().current.as_ref().is_some_and(|c| c.speaking)
    }

    fn is_pending(&self) -> bool {
        self.lock().current.as_ref().is_some_and(|c| !c.speaking)
    }
}

/// Drive one utterance through its scripted lifecycle.
async fn perform(
    state: Arc<Mutex<State>>,
    mut paused: watch::Receiver<bool>,
    cancel: CancellationToken,
    sink: UtteranceSink,
    outcome: Outcome,
    start_latency: Duration,
    duration: Duration,
) {
    let attempt = sink.attempt();

    if !play_for(start_latency, &cancel, &mut paused).await {
        return;
    }

    let speak_for = match &outcome {
        Outcome::Fail(code) => {
            update_current(&state, attempt, |s| s.current = None);
            sink.failed(code.clone());
            return;
        }
        Outcome::Silent | Outcome::Reject(_) => return,
        Outcome::Speak | Outcome::Lost => duration,
        Outcome::LateEnd(extra) => duration + *extra,
    };

    update_current(&state, attempt, |s| {
        if let Some(current) = s.current.as_mut() {
            current.speaking = true;
        }
    });
    sink.started();

    if !play_for(speak_for, &cancel, &mut paused).await {
        return;
    }
    update_current(&state, attempt, |s| s.current = None);

    if outcome != Outcome::Lost {
        sink.ended();
    }
}

/// Apply `f` only while `attempt` is still the platform's current utterance.
fn update_current(state: &Mutex<State>, attempt: AttemptId, f: impl FnOnce(&mut State)) {
    let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
    if guard.current.as_ref().is_some_and(|c| c.attempt == attempt) {
        f(&mut guard);
    }
}

/// Sleep for `length` of unpaused time. Returns `false` if cancelled.
async fn play_for(
    length: Duration,
    cancel: &CancellationToken,
    paused: &mut watch::Receiver<bool>,
) -> bool {
    let mut remaining = length;
    loop {
        if *paused.borrow_and_update() {
            tokio::select! {
                () = cancel.cancelled() => return false,
                changed = paused.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
            continue;
        }

        let started = Instant::now();
        tokio::select! {
            () = cancel.cancelled() => return false,
            () = tokio::time::sleep(remaining) => return true,
            changed = paused.changed() => {
                if changed.is_err() {
                    return false;
                }
                remaining = remaining.saturating_sub(started.elapsed());
            }
        }
    }
}

fn default_voices() -> Vec<VoiceDescriptor> {
    vec![
        VoiceDescriptor::new("Samantha", "en-US", 1)
            .with_id("sim.en-US.samantha")
            .as_default(),
        VoiceDescriptor::new("Alex", "en-US", 2).with_id("sim.en-US.alex"),
        VoiceDescriptor::new("Daniel", "en-GB", 1).with_id("sim.en-GB.daniel"),
        VoiceDescriptor::new("Thomas", "fr-FR", 1).with_id("sim.fr-FR.thomas"),
        VoiceDescriptor::new("Anna", "de-DE", 1).with_id("sim.de-DE.anna"),
    ]
}
