//! One conversational turn: advance the session, then either answer with the
//! safety message or ask the chat service.

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::actors::traits::LlmActor;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::geo::{CrisisContact, LIFELINE_988};
use crate::models::{ChatMessage, Message};
use crate::session::{SessionMachine, SessionMode, SessionState};

/// Shown when no credential is configured.
pub const FALLBACK_NO_CREDENTIAL: &str = "I'm not able to reach my conversation service right now, \
but I'm still here to listen. Would you like to keep writing about what's on your mind?";

/// Shown when the chat service fails for any other reason.
pub const FALLBACK_REMOTE_FAILURE: &str = "I'm sorry, I had trouble putting my thoughts together \
just now. Could you tell me a little more about how you're feeling?";

const SAFETY_OPENING: &str = "It sounds like you are going through something really painful, \
and I'm glad you told me. Your safety matters most right now. Please reach out to someone who \
can help you right away:";

const SAFETY_CLOSING: &str = "If you are in immediate danger, call your local emergency number. \
I'm still here and happy to keep talking with you.";

const MIN_TYPING_DELAY: Duration = Duration::from_secs(1);
const MAX_TYPING_DELAY: Duration = Duration::from_secs(3);
const TYPING_DELAY_PER_CHAR: Duration = Duration::from_millis(30);

/// What the assistant says for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Reply {
    /// Fixed crisis message. The chat service was not called.
    Safety(String),
    /// The chat service's reply, verbatim.
    Model(String),
    /// Canned text after a chat-service failure.
    Fallback(String),
    /// The call was cancelled; there is nothing to show.
    Abandoned,
}

impl Reply {
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Safety(t) | Reply::Model(t) | Reply::Fallback(t) => Some(t),
            Reply::Abandoned => None,
        }
    }
}

fn format_contact(contact: &CrisisContact) -> String {
    match (contact.phone.is_empty(), contact.text) {
        (false, Some(text)) => format!("- {}: call {} ({})", contact.name, contact.phone, text),
        (false, None) => format!("- {}: call {}", contact.name, contact.phone),
        (true, Some(text)) => format!("- {}: {}", contact.name, text),
        (true, None) => format!("- {}", contact.name),
    }
}

/// The crisis reply. Always lists the 988 lifeline first.
pub fn safety_message(local_contacts: &[CrisisContact]) -> String {
    let mut lines = vec![SAFETY_OPENING.to_string(), format_contact(&LIFELINE_988)];
    lines.extend(
        local_contacts
            .iter()
            .filter(|c| **c != LIFELINE_988)
            .map(format_contact),
    );
    lines.push(SAFETY_CLOSING.to_string());
    lines.join("\n")
}

/// Pause before the reply appears: proportional to length, 1 to 3 seconds.
pub fn typing_delay(reply: &str) -> Duration {
    let chars = u32::try_from(reply.chars().count()).unwrap_or(u32::MAX);
    TYPING_DELAY_PER_CHAR
        .saturating_mul(chars)
        .clamp(MIN_TYPING_DELAY, MAX_TYPING_DELAY)
}

/// `None` without a question mark; `open` for how/what/why/tell questions, else `closed`.
pub fn question_type(reply: &str) -> Option<String> {
    let question = reply
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.ends_with('?'))
        .last()?;
    let first = question
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let kind = match first.trim_matches(|c: char| !c.is_alphanumeric()) {
        "how" | "what" | "why" | "tell" => "open",
        _ => "closed",
    };
    Some(kind.to_string())
}

fn fallback_for(err: &AppError) -> &'static str {
    match err {
        AppError::Config(_) => FALLBACK_NO_CREDENTIAL,
        _ => FALLBACK_REMOTE_FAILURE,
    }
}

pub struct ResponseOrchestrator<L: LlmActor> {
    llm: Arc<L>,
    machine: SessionMachine,
    config: Arc<AppConfig>,
    safety_message: String,
}

impl<L: LlmActor> ResponseOrchestrator<L> {
    pub fn new(
        llm: Arc<L>,
        machine: SessionMachine,
        config: Arc<AppConfig>,
        local_contacts: &[CrisisContact],
    ) -> Self {
        Self {
            llm,
            machine,
            config,
            safety_message: safety_message(local_contacts),
        }
    }

    pub fn safety_message(&self) -> &str {
        &self.safety_message
    }

    /// Runs a turn that cannot be cancelled.
    pub async fn respond(
        &self,
        user_text: &str,
        state: &SessionState,
        history: &[Message],
    ) -> (Reply, SessionState) {
        let (_handle, registration) = AbortHandle::new_pair();
        self.respond_abortable(user_text, state, history, registration)
            .await
    }

    /// Runs a turn whose chat call stops when the paired `AbortHandle` fires.
    ///
    /// The returned state is always the advanced one, whatever happened to the call.
    #[instrument(skip_all, fields(depth = state.session_depth + 1))]
    pub async fn respond_abortable(
        &self,
        user_text: &str,
        state: &SessionState,
        history: &[Message],
        registration: AbortRegistration,
    ) -> (Reply, SessionState) {
        let mut next = self.machine.update_session_state(state, user_text);

        if let SessionMode::Crisis { phrase } = &next.mode {
            warn!(phrase = %phrase, "Answering with the safety message");
            return (Reply::Safety(self.safety_message.clone()), next);
        }

        let messages = self.build_messages(user_text, &next, history);
        let call = Abortable::new(self.llm.complete(messages), registration);

        let reply = match call.await {
            Ok(Ok(text)) => {
                next.last_question_type = question_type(&text);
                Reply::Model(text)
            }
            Ok(Err(e)) => {
                warn!("Chat service failed, using fallback: {}", e);
                Reply::Fallback(fallback_for(&e).to_string())
            }
            Err(aborted) => {
                info!("Turn abandoned: {}", AppError::from(aborted));
                Reply::Abandoned
            }
        };
        (reply, next)
    }

    /// System prompt, the last `history_window` messages, then the new text.
    pub fn build_messages(
        &self,
        user_text: &str,
        state: &SessionState,
        history: &[Message],
    ) -> Vec<ChatMessage> {
        let window = self.config.history_window;
        let start = history.len().saturating_sub(window);

        let mut messages = Vec::with_capacity(window + 2);
        messages.push(ChatMessage::system(self.system_prompt(state)));
        messages.extend(history[start..].iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(user_text));
        messages
    }

    fn system_prompt(&self, state: &SessionState) -> String {
        let emotions = state
            .dominant_emotions
            .iter()
            .map(|e| e.label())
            .collect::<Vec<_>>()
            .join(", ");
        let approaches = state
            .approach_used
            .iter()
            .map(|a| a.label())
            .collect::<Vec<_>>()
            .join(", ");

        let mut prompt = self.config.system_prompt.clone();
        prompt.push_str(&format!(
            "\n\nConversation context: the user currently seems to feel {}. Suggested approach: {}.",
            emotions, approaches
        ));
        if !state.recent_topics.is_empty() {
            prompt.push_str(&format!(
                " Recent topics: {}.",
                state.recent_topics.join(", ")
            ));
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLlm {
        calls: AtomicUsize,
        reply: Result<String, AppError>,
    }

    #[async_trait]
    impl LlmActor for CountingLlm {
        async fn complete(&self, _messages: Vec<ChatMessage>) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn orchestrator(reply: Result<String, AppError>) -> ResponseOrchestrator<CountingLlm> {
        ResponseOrchestrator::new(
            Arc::new(CountingLlm {
                calls: AtomicUsize::new(0),
                reply,
            }),
            SessionMachine::default(),
            Arc::new(AppConfig::default()),
            crate::geo::hotlines_for("GB", "US"),
        )
    }

    #[test]
    fn test_safety_message_lists_988_then_local_lines() {
        let msg = safety_message(crate::geo::hotlines_for("GB", "US"));
        assert!(msg.contains("988"));
        assert!(msg.contains("Samaritans: call 116 123"));
        let us = safety_message(crate::geo::hotlines_for("US", "US"));
        assert_eq!(us.matches("988 Suicide & Crisis Lifeline").count(), 1);
    }

    #[tokio::test]
    async fn test_crisis_reply_is_the_local_safety_message() {
        let orch = orchestrator(Ok("unused".to_string()));
        assert_eq!(
            orch.safety_message(),
            safety_message(crate::geo::hotlines_for("GB", "US"))
        );
        let (reply, _) = orch
            .respond("I want to end my life", &SessionState::default(), &[])
            .await;
        assert_eq!(reply, Reply::Safety(orch.safety_message().to_string()));
    }

    #[test]
    fn test_typing_delay_bounds() {
        assert_eq!(typing_delay(""), MIN_TYPING_DELAY);
        assert_eq!(typing_delay(&"x".repeat(50)), Duration::from_millis(1500));
        assert_eq!(typing_delay(&"x".repeat(5000)), MAX_TYPING_DELAY);
    }

    #[test]
    fn test_question_type() {
        assert_eq!(question_type("That sounds hard."), None);
        assert_eq!(
            question_type("That sounds hard. What happened next?").as_deref(),
            Some("open")
        );
        assert_eq!(
            question_type("I hear you. Did you sleep at all?").as_deref(),
            Some("closed")
        );
    }

    #[tokio::test]
    async fn test_crisis_turn_skips_the_chat_service() {
        let orch = orchestrator(Ok("should not be used".to_string()));
        let (reply, state) = orch
            .respond("I want to end my life.", &SessionState::default(), &[])
            .await;
        assert!(matches!(reply, Reply::Safety(ref t) if t.contains("988")));
        assert!(state.crisis_detected());
        assert_eq!(state.session_depth, 1);
        assert_eq!(orch.llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_reply_returned_verbatim() {
        let orch = orchestrator(Ok("  How did that feel?  ".to_string()));
        let (reply, state) = orch
            .respond("I had a long day", &SessionState::default(), &[])
            .await;
        assert_eq!(reply, Reply::Model("  How did that feel?  ".to_string()));
        assert_eq!(state.last_question_type.as_deref(), Some("open"));
        assert_eq!(orch.llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_map_to_fallbacks_and_keep_state() {
        let orch = orchestrator(Err(AppError::Config("no key".into())));
        let (reply, state) = orch.respond("hello", &SessionState::default(), &[]).await;
        assert_eq!(reply, Reply::Fallback(FALLBACK_NO_CREDENTIAL.to_string()));
        assert_eq!(state.session_depth, 1);

        let orch = orchestrator(Err(AppError::Timeout("slow".into())));
        let (reply, state) = orch.respond("hello", &state, &[]).await;
        assert_eq!(reply, Reply::Fallback(FALLBACK_REMOTE_FAILURE.to_string()));
        assert_eq!(state.session_depth, 2);
    }

    #[tokio::test]
    async fn test_aborted_call_is_abandoned_but_state_committed() {
        let orch = orchestrator(Ok("late".to_string()));
        let (handle, registration) = AbortHandle::new_pair();
        handle.abort();
        let (reply, state) = orch
            .respond_abortable("hello", &SessionState::default(), &[], registration)
            .await;
        assert_eq!(reply, Reply::Abandoned);
        assert_eq!(state.session_depth, 1);
    }

    #[test]
    fn test_history_window() {
        let orch = orchestrator(Ok(String::new()));
        let history: Vec<Message> = (0..15)
            .map(|i| Message::user(format!("entry {}", i), None))
            .collect();
        let messages = orch.build_messages("now", &SessionState::default(), &history);
        assert_eq!(messages.len(), 12);
        assert_eq!(messages[0].role, crate::models::ChatRole::System);
        assert_eq!(messages[1].content, "entry 5");
        assert_eq!(messages[11].content, "now");
    }
}
