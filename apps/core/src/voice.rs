//! Optional speech input and output.
//!
//! Both directions are capabilities, not requirements. A missing backend or a
//! denied permission turns the matching flag off and the conversation carries on
//! as text.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AppError;

/// One update from a speech-to-text stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Best guess for the words currently being spoken; replaces the previous partial.
    Partial(String),
    /// Words the recognizer will not revise.
    Final(String),
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync + 'static {
    /// Fails when the platform lacks speech input or the user denied the microphone.
    async fn check_available(&self) -> Result<(), AppError>;

    /// Starts listening. Events arrive until [`SpeechRecognizer::stop`] or the stream ends.
    async fn start(&self) -> Result<mpsc::Receiver<TranscriptEvent>, AppError>;

    async fn stop(&self);
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + 'static {
    async fn check_available(&self) -> Result<(), AppError>;

    /// Speaks one utterance, returning once it has finished.
    async fn speak(&self, text: &str) -> Result<(), AppError>;

    /// Silences the current utterance, if any.
    fn cancel(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VoiceCapabilities {
    pub speech_to_text: bool,
    pub text_to_speech: bool,
}

/// Voice backends that passed their availability check.
#[derive(Clone, Default)]
pub struct VoiceIo {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl VoiceIo {
    /// Text only.
    pub fn none() -> Self {
        Self::default()
    }

    /// Keeps only the backends that report themselves usable.
    pub async fn probe(
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        let recognizer = match recognizer {
            Some(r) => match r.check_available().await {
                Ok(()) => Some(r),
                Err(e) => {
                    debug!("Speech input disabled: {}", e);
                    None
                }
            },
            None => None,
        };
        let synthesizer = match synthesizer {
            Some(s) => match s.check_available().await {
                Ok(()) => Some(s),
                Err(e) => {
                    debug!("Speech output disabled: {}", e);
                    None
                }
            },
            None => None,
        };
        Self {
            recognizer,
            synthesizer,
        }
    }

    pub fn capabilities(&self) -> VoiceCapabilities {
        VoiceCapabilities {
            speech_to_text: self.recognizer.is_some(),
            text_to_speech: self.synthesizer.is_some(),
        }
    }

    /// Starts a dictation session, or `None` when speech input is unavailable.
    pub async fn listen(&self) -> Option<VoiceInput> {
        let recognizer = self.recognizer.clone()?;
        match VoiceInput::start(recognizer).await {
            Ok(input) => Some(input),
            Err(e) => {
                debug!("Speech input could not start: {}", e);
                None
            }
        }
    }

    pub fn speaker(&self) -> Option<Speaker> {
        self.synthesizer.clone().map(Speaker::new)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Transcript {
    committed: String,
    partial: String,
}

impl Transcript {
    fn apply(&mut self, event: TranscriptEvent) {
        match event {
            TranscriptEvent::Partial(text) => self.partial = text,
            TranscriptEvent::Final(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    if !self.committed.is_empty() {
                        self.committed.push(' ');
                    }
                    self.committed.push_str(text);
                }
                self.partial.clear();
            }
        }
    }

    fn flush(&self) -> String {
        let partial = self.partial.trim();
        if partial.is_empty() {
            self.committed.clone()
        } else if self.committed.is_empty() {
            partial.to_string()
        } else {
            format!("{} {}", self.committed, partial)
        }
    }
}

/// An in-progress dictation.
pub struct VoiceInput {
    recognizer: Arc<dyn SpeechRecognizer>,
    transcript: Arc<Mutex<Transcript>>,
    pump: JoinHandle<()>,
}

impl VoiceInput {
    pub async fn start(recognizer: Arc<dyn SpeechRecognizer>) -> Result<Self, AppError> {
        let mut events = recognizer.start().await?;
        let transcript = Arc::new(Mutex::new(Transcript::default()));
        let sink = transcript.clone();
        let pump = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                sink.lock().await.apply(event);
            }
        });
        Ok(Self {
            recognizer,
            transcript,
            pump,
        })
    }

    /// What would be submitted if the user stopped now.
    pub async fn preview(&self) -> String {
        self.transcript.lock().await.flush()
    }

    /// Stops listening and returns the committed plus partial transcript.
    ///
    /// `None` when nothing was heard.
    pub async fn stop(self) -> Option<String> {
        self.recognizer.stop().await;
        self.pump.abort();
        let text = self.transcript.lock().await.flush();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Speaks replies one at a time. A new utterance cuts off the previous one.
pub struct Speaker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    current: Option<JoinHandle<()>>,
}

impl Speaker {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            current: None,
        }
    }

    pub fn speak(&mut self, text: impl Into<String>) {
        self.cancel();
        let synthesizer = self.synthesizer.clone();
        let text = text.into();
        self.current = Some(tokio::spawn(async move {
            if let Err(e) = synthesizer.speak(&text).await {
                warn!("Speech output failed: {}", e);
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            if !handle.is_finished() {
                self.synthesizer.cancel();
                handle.abort();
            }
        }
    }
}

impl Drop for Speaker {
    fn drop(&mut self) {
        self.cancel();
    }
}
