use futures::future::AbortRegistration;
use std::collections::BTreeMap;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::actors::supervisor::TurnOutcome;
use crate::brain::Emotion;
use crate::models::{ChatMessage, Message, Theme};
use crate::mood::EmotionEntry;
use crate::session::SessionState;

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to the `LlmActor`.
#[derive(Debug)]
pub enum LlmMessage {
    /// A request for one chat completion.
    Complete {
        messages: Vec<ChatMessage>,
        /// A channel to send the reply text back.
        responder: oneshot::Sender<Result<String, AppError>>,
    },
}

/// Messages that can be sent to the `SupervisorActor`.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// A user turn. Its abort handle is registered before it is queued.
    ProcessUserMessage {
        content: String,
        turn: Uuid,
        registration: AbortRegistration,
        responder: oneshot::Sender<Result<TurnOutcome, AppError>>,
    },
    /// Forget the conversation and start a fresh session.
    ResetSession {
        responder: oneshot::Sender<Result<(), AppError>>,
    },
    /// Reset the user profile to neutral defaults.
    ClearProfile {
        responder: oneshot::Sender<Result<(), AppError>>,
    },
    /// A manual mood check-in.
    LogMood {
        emotions: BTreeMap<Emotion, f64>,
        note: Option<String>,
        responder: oneshot::Sender<Result<EmotionEntry, AppError>>,
    },
    MoodHistory {
        responder: oneshot::Sender<Vec<EmotionEntry>>,
    },
    Conversation {
        responder: oneshot::Sender<Vec<Message>>,
    },
    SessionState {
        responder: oneshot::Sender<SessionState>,
    },
    SetTheme {
        theme: Theme,
        responder: oneshot::Sender<Result<(), AppError>>,
    },
    Theme {
        responder: oneshot::Sender<Theme>,
    },
    /// A command to shut down the supervisor.
    Shutdown,
}
