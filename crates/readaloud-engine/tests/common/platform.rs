//! A speech platform that only reports what the test tells it to.

use std::sync::Mutex;

use async_trait::async_trait;
use readaloud_engine::{
    PlatformCapabilities, PlatformError, PlatformKind, SpeechPlatform, Utterance, UtteranceSink,
    VoiceDescriptor,
};

#[derive(Default)]
struct Inner {
    submitted: Vec<(Utterance, UtteranceSink)>,
    cancels: usize,
    speaking: bool,
}

/// Records every submission and hands its sink back to the test, so events
/// can be fired at arbitrary times, including after the attempt is stale.
pub struct ManualPlatform {
    kind: PlatformKind,
    capabilities: PlatformCapabilities,
    inner: Mutex<Inner>,
}

impl ManualPlatform {
    pub fn new(kind: PlatformKind) -> Self {
        Self {
            kind,
            capabilities: PlatformCapabilities::full(),
            inner: Mutex::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: PlatformCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Sink of the `n`th submission.
    pub fn sink(&self, n: usize) -> UtteranceSink {
        self.inner.lock().unwrap().submitted[n].1.clone()
    }

    /// Sink of the latest submission.
    pub fn last_sink(&self) -> UtteranceSink {
        self.inner
            .lock()
            .unwrap()
            .submitted
            .last()
            .expect("nothing submitted")
            .1
            .clone()
    }

    pub fn submitted(&self) -> Vec<Utterance> {
        self.inner
            .lock()
            .unwrap()
            .submitted
            .iter()
            .map(|(u, _)| u.clone())
            .collect()
    }

    pub fn cancel_count(&self) -> usize {
        self.inner.lock().unwrap().cancels
    }

    /// What `is_speaking()` reports.
    pub fn set_speaking(&self, speaking: bool) {
        self.inner.lock().unwrap().speaking = speaking;
    }
}

#[async_trait]
impl SpeechPlatform for ManualPlatform {
    fn kind(&self) -> PlatformKind {
        self.kind
    }

    fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    async fn voices(&self) -> Vec<VoiceDescriptor> {
        vec![VoiceDescriptor::new("Manual", "en-US", 0)]
    }

    fn speak(&self, utterance: Utterance, sink: UtteranceSink) -> Result<(), PlatformError> {
        self.inner.lock().unwrap().submitted.push((utterance, sink));
        Ok(())
    }

    fn cancel(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.cancels += 1;
        inner.speaking = false;
    }

    fn pause(&self) -> bool {
        self.capabilities.can_pause
    }

    fn resume(&self) -> bool {
        self.capabilities.can_resume
    }

    fn is_speaking(&self) -> bool {
        self.inner.lock().unwrap().speaking
    }

    fn is_pending(&self) -> bool {
        false
    }
}
