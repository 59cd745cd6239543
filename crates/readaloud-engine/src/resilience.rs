//! Platform resilience: attempt ids, retry decisions, and watchdog timers.
//!
//! Every submission to the platform gets a fresh [`AttemptId`]. Watchdogs
//! and scheduled steps are armed against that id and a cancellation token,
//! so superseding the attempt both cancels outstanding timers and lets the
//! controller recognise anything that slipped through.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use readaloud_core::{AttemptId, DEFAULT_MAX_RETRIES, PlatformError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Mints monotonically increasing attempt ids.
#[derive(Debug, Default)]
pub struct AttemptCounter {
    last: AttemptId,
}

impl AttemptCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next id.
    pub fn mint(&mut self) -> AttemptId {
        self.last = self.last.next();
        self.last
    }

    /// Most recently minted id (`AttemptId::ZERO` if none).
    #[must_use]
    pub const fn last(&self) -> AttemptId {
        self.last
    }
}

// ── Retry policy ─────────────────────────────────────────────────────────────

/// What to do with a sentence whose attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Speak the same sentence again; `retry` is the new retry count.
    Retry { retry: u32 },
    /// Give up on the sentence after `attempts` tries and move on.
    Skip { attempts: u32 },
}

/// Bounded retry policy for per-sentence failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Decide how to handle `error` on a sentence that has already been
    /// retried `retries` times.
    ///
    /// Transient errors are retried until the budget is spent; anything
    /// else skips immediately.
    #[must_use]
    pub fn decide(&self, error: &PlatformError, retries: u32) -> FailureAction {
        if error.is_transient() && retries < self.max_retries {
            FailureAction::Retry { retry: retries + 1 }
        } else {
            FailureAction::Skip {
                attempts: retries + 1,
            }
        }
    }
}

// ── Watchdogs ────────────────────────────────────────────────────────────────

/// Deferred signals the controller arms against an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Estimated duration plus buffer elapsed without an end event.
    Backup,
    /// The platform never reported that it started speaking.
    EarlyDetection,
    /// Scheduled submission of the current sentence (inter-sentence gap
    /// or retry delay).
    Step,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Backup => "backup",
            Self::EarlyDetection => "early-detection",
            Self::Step => "step",
        })
    }
}

type Fire = dyn Fn(AttemptId, TimerKind) + Send + Sync;

/// Spawns cancellable one-shot timers that report back through a callback.
#[derive(Clone)]
pub struct Watchdog {
    fire: Arc<Fire>,
}

impl Watchdog {
    /// Create a watchdog whose timers call `fire` when they expire.
    pub fn new(fire: impl Fn(AttemptId, TimerKind) + Send + Sync + 'static) -> Self {
        Self {
            fire: Arc::new(fire),
        }
    }

    /// Arm a `kind` timer for `attempt` that fires after `after` unless
    /// `token` is cancelled first.
    pub fn arm(
        &self,
        token: &CancellationToken,
        attempt: AttemptId,
        kind: TimerKind,
        after: Duration,
    ) -> JoinHandle<()> {
        let token = token.clone();
        let fire = Arc::clone(&self.fire);
        trace!(%attempt, %kind, ?after, "Arming timer");

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(after) => fire(attempt, kind),
            }
        })
    }
}

impl fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watchdog").finish_non_exhaustive()
    }
}
