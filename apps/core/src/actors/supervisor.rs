use crate::actors::llm::LlmActorHandle;
use crate::actors::messages::{AppError, SupervisorMessage};
use crate::actors::orchestrator::{typing_delay, Reply, ResponseOrchestrator};
use crate::actors::traits::LlmActor;
use crate::brain::{Emotion, LexicalAnalyzer};
use crate::config::AppConfig;
use crate::database::{self, RecordKey};
use crate::geo::CrisisContact;
use crate::models::{Message, Theme};
use crate::mood::EmotionEntry;
use crate::random::{RandomSource, ThreadRandom};
use crate::resources::{Resource, ResourceSelector};
use crate::session::{SessionMachine, SessionState};
use futures::future::{AbortHandle, AbortRegistration};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

const QUERY_TIMEOUT: Duration = Duration::from_secs(10);
/// Slack on top of the chat timeout for a whole turn.
const TURN_GRACE: Duration = Duration::from_secs(10);

/// Everything the host needs to render one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: Reply,
    /// How long to show a typing indicator before the reply.
    pub typing_delay: Duration,
    pub resource: Option<Resource>,
    pub session_depth: u64,
    pub crisis: bool,
}

/// Latest submitted turn and its abort handle, shared with the runner so a
/// turn can be abandoned whether it is still queued or already waiting on
/// the chat service.
type PendingCall = Arc<Mutex<Option<(Uuid, AbortHandle)>>>;

/// A handle to the `SupervisorActor`.
///
/// This is the primary entry point for the conversational flow. The actor owns
/// the four persisted records and handles one message at a time, so turns never
/// overlap.
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorMessage>,
    pending: PendingCall,
    turn_timeout: Duration,
}

impl SupervisorHandle {
    /// Loads the persisted records and spawns the actor with the HTTP chat client.
    pub async fn start(
        config: Arc<AppConfig>,
        pool: SqlitePool,
        contacts: &'static [CrisisContact],
    ) -> Result<Self, AppError> {
        let llm = Arc::new(LlmActorHandle::new(config.clone()));
        Self::start_with(
            config,
            pool,
            llm,
            contacts,
            Box::new(ThreadRandom::default()),
            Box::new(ThreadRandom::default()),
        )
        .await
    }

    /// Same as [`SupervisorHandle::start`] with an explicit chat backend and
    /// random sources (analyzer first, resource selector second).
    pub async fn start_with<L: LlmActor>(
        config: Arc<AppConfig>,
        pool: SqlitePool,
        llm: Arc<L>,
        contacts: &'static [CrisisContact],
        analyzer_rng: Box<dyn RandomSource>,
        resource_rng: Box<dyn RandomSource>,
    ) -> Result<Self, AppError> {
        let (sender, receiver) = mpsc::channel(32);
        let pending: PendingCall = Arc::new(Mutex::new(None));
        let machine = SessionMachine::new(Arc::new(LexicalAnalyzer::with_random(analyzer_rng)));
        let orchestrator = ResponseOrchestrator::new(llm, machine, config.clone(), contacts);
        let selector = ResourceSelector::new(contacts, resource_rng);

        let runner =
            SupervisorRunner::load(receiver, pool, orchestrator, selector, pending.clone()).await?;
        tokio::spawn(async move { runner.run().await });

        Ok(Self {
            sender,
            pending,
            turn_timeout: Duration::from_secs(config.request_timeout_secs) + TURN_GRACE,
        })
    }

    async fn request<T>(
        &self,
        msg: SupervisorMessage,
        recv: oneshot::Receiver<T>,
        limit: Duration,
    ) -> Result<T, AppError> {
        self.sender
            .send(msg)
            .await
            .map_err(|e| AppError::Actor(e.to_string()))?;
        Ok(timeout(limit, recv).await??)
    }

    /// Processes one user entry.
    ///
    /// A turn still waiting on the chat service is abandoned first; its state
    /// update stays committed.
    #[instrument(skip(self, content), fields(chars = content.len()))]
    pub async fn process_message(&self, content: String) -> Result<TurnOutcome, AppError> {
        let turn = Uuid::new_v4();
        let (abort, registration) = AbortHandle::new_pair();
        {
            let mut pending = self.pending.lock().await;
            if let Some((_, previous)) = pending.replace((turn, abort)) {
                previous.abort();
                info!("Pending turn cancelled");
            }
        }
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::ProcessUserMessage {
            content,
            turn,
            registration,
            responder: send,
        };
        self.request(msg, recv, self.turn_timeout).await?
    }

    /// Abandons the in-flight chat call, if any. Returns whether one was pending.
    pub async fn cancel_pending(&self) -> bool {
        match self.pending.lock().await.take() {
            Some((_, handle)) => {
                handle.abort();
                info!("Pending turn cancelled");
                true
            }
            None => false,
        }
    }

    #[instrument(skip(self))]
    pub async fn reset_session(&self) -> Result<(), AppError> {
        self.cancel_pending().await;
        let (send, recv) = oneshot::channel();
        self.request(SupervisorMessage::ResetSession { responder: send }, recv, QUERY_TIMEOUT)
            .await?
    }

    #[instrument(skip(self))]
    pub async fn clear_profile(&self) -> Result<(), AppError> {
        let (send, recv) = oneshot::channel();
        self.request(SupervisorMessage::ClearProfile { responder: send }, recv, QUERY_TIMEOUT)
            .await?
    }

    /// Records a manual mood check-in.
    pub async fn log_mood(
        &self,
        emotions: BTreeMap<Emotion, f64>,
        note: Option<String>,
    ) -> Result<EmotionEntry, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::LogMood {
            emotions,
            note,
            responder: send,
        };
        self.request(msg, recv, QUERY_TIMEOUT).await?
    }

    pub async fn mood_history(&self) -> Result<Vec<EmotionEntry>, AppError> {
        let (send, recv) = oneshot::channel();
        self.request(SupervisorMessage::MoodHistory { responder: send }, recv, QUERY_TIMEOUT)
            .await
    }

    pub async fn conversation(&self) -> Result<Vec<Message>, AppError> {
        let (send, recv) = oneshot::channel();
        self.request(SupervisorMessage::Conversation { responder: send }, recv, QUERY_TIMEOUT)
            .await
    }

    pub async fn session_state(&self) -> Result<SessionState, AppError> {
        let (send, recv) = oneshot::channel();
        self.request(SupervisorMessage::SessionState { responder: send }, recv, QUERY_TIMEOUT)
            .await
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), AppError> {
        let (send, recv) = oneshot::channel();
        self.request(
            SupervisorMessage::SetTheme {
                theme,
                responder: send,
            },
            recv,
            QUERY_TIMEOUT,
        )
        .await?
    }

    pub async fn theme(&self) -> Result<Theme, AppError> {
        let (send, recv) = oneshot::channel();
        self.request(SupervisorMessage::Theme { responder: send }, recv, QUERY_TIMEOUT)
            .await
    }

    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.cancel_pending().await;
        self.sender
            .send(SupervisorMessage::Shutdown)
            .await
            .map_err(|e| AppError::Actor(e.to_string()))
    }
}

// --- Actor Runner ---
struct SupervisorRunner<L: LlmActor> {
    receiver: mpsc::Receiver<SupervisorMessage>,
    pool: SqlitePool,
    orchestrator: ResponseOrchestrator<L>,
    selector: ResourceSelector,
    pending: PendingCall,
    conversation: Vec<Message>,
    state: SessionState,
    mood_history: Vec<EmotionEntry>,
    theme: Theme,
}

impl<L: LlmActor> SupervisorRunner<L> {
    async fn load(
        receiver: mpsc::Receiver<SupervisorMessage>,
        pool: SqlitePool,
        orchestrator: ResponseOrchestrator<L>,
        selector: ResourceSelector,
        pending: PendingCall,
    ) -> Result<Self, AppError> {
        let conversation: Vec<Message> = database::load_record(&pool, RecordKey::Conversation).await?;
        let state: SessionState = database::load_record(&pool, RecordKey::SessionState).await?;
        let mood_history: Vec<EmotionEntry> =
            database::load_record(&pool, RecordKey::MoodHistory).await?;
        let theme: Theme = database::load_record(&pool, RecordKey::Theme).await?;
        info!(
            messages = conversation.len(),
            depth = state.session_depth,
            moods = mood_history.len(),
            "Restored client records"
        );

        Ok(Self {
            receiver,
            pool,
            orchestrator,
            selector,
            pending,
            conversation,
            state,
            mood_history,
            theme,
        })
    }

    async fn run(mut self) {
        info!("Supervisor started");
        while let Some(msg) = self.receiver.recv().await {
            if let SupervisorMessage::Shutdown = msg {
                info!("Supervisor shutting down...");
                break;
            }
            self.handle_message(msg).await;
        }
        info!("Supervisor stopped");
    }

    async fn handle_message(&mut self, msg: SupervisorMessage) {
        match msg {
            SupervisorMessage::ProcessUserMessage {
                content,
                turn,
                registration,
                responder,
            } => {
                let result = self.handle_user_message(content, registration).await;
                self.release_pending(turn).await;
                if let Err(e) = &result {
                    error!("Error processing user message: {:?}", e);
                }
                let _ = responder.send(result);
            }
            SupervisorMessage::ResetSession { responder } => {
                let _ = responder.send(self.reset_session().await);
            }
            SupervisorMessage::ClearProfile { responder } => {
                self.state.user_profile.clear();
                let result = database::save_record(&self.pool, RecordKey::SessionState, &self.state).await;
                let _ = responder.send(result);
            }
            SupervisorMessage::LogMood {
                emotions,
                note,
                responder,
            } => {
                let entry = EmotionEntry::new(&emotions, note);
                self.mood_history.push(entry.clone());
                let result =
                    database::save_record(&self.pool, RecordKey::MoodHistory, &self.mood_history)
                        .await
                        .map(|_| entry);
                let _ = responder.send(result);
            }
            SupervisorMessage::MoodHistory { responder } => {
                let _ = responder.send(self.mood_history.clone());
            }
            SupervisorMessage::Conversation { responder } => {
                let _ = responder.send(self.conversation.clone());
            }
            SupervisorMessage::SessionState { responder } => {
                let _ = responder.send(self.state.clone());
            }
            SupervisorMessage::SetTheme { theme, responder } => {
                self.theme = theme;
                let _ = responder.send(database::save_record(&self.pool, RecordKey::Theme, &theme).await);
            }
            SupervisorMessage::Theme { responder } => {
                let _ = responder.send(self.theme);
            }
            SupervisorMessage::Shutdown => {}
        }
    }

    /// Clears the shared slot if it still belongs to `turn`.
    async fn release_pending(&self, turn: Uuid) {
        let mut pending = self.pending.lock().await;
        if matches!(pending.as_ref(), Some((id, _)) if *id == turn) {
            pending.take();
        }
    }

    #[instrument(skip(self, content, registration))]
    async fn handle_user_message(
        &mut self,
        content: String,
        registration: AbortRegistration,
    ) -> Result<TurnOutcome, AppError> {
        let text = content.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Empty entry".to_string()));
        }

        let (reply, next) = self
            .orchestrator
            .respond_abortable(text, &self.state, &self.conversation, registration)
            .await;

        // The state update is committed whatever the reply turned out to be.
        self.state = next;
        let analysis = self.state.last_analysis.clone();
        if let Some(a) = &analysis {
            let entry = EmotionEntry::new(&a.emotions, None);
            if !entry.emotions.is_empty() {
                self.mood_history.push(entry);
            }
        }
        self.conversation.push(Message::user(text, analysis));
        if let Some(reply_text) = reply.text() {
            self.conversation.push(Message::assistant(reply_text));
        }

        let resource = self
            .selector
            .maybe_select_resource(&self.state, self.state.session_depth);

        self.persist_turn().await;

        Ok(TurnOutcome {
            typing_delay: reply.text().map(typing_delay).unwrap_or_default(),
            reply,
            resource,
            session_depth: self.state.session_depth,
            crisis: self.state.crisis_detected(),
        })
    }

    /// Saves the records a turn touches. A failed write is logged and the turn
    /// still completes; the in-memory copy stays authoritative.
    async fn persist_turn(&self) {
        if let Err(e) = database::save_record(&self.pool, RecordKey::SessionState, &self.state).await {
            error!("Failed to persist session state: {}", e);
        }
        if let Err(e) =
            database::save_record(&self.pool, RecordKey::Conversation, &self.conversation).await
        {
            error!("Failed to persist conversation: {}", e);
        }
        if let Err(e) =
            database::save_record(&self.pool, RecordKey::MoodHistory, &self.mood_history).await
        {
            error!("Failed to persist mood history: {}", e);
        }
    }

    async fn reset_session(&mut self) -> Result<(), AppError> {
        warn!(depth = self.state.session_depth, "Resetting session");
        self.state = SessionState::default();
        self.conversation.clear();
        database::delete_record(&self.pool, RecordKey::SessionState).await?;
        database::delete_record(&self.pool, RecordKey::Conversation).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_db;
    use crate::geo::hotlines_for;
    use crate::models::ChatMessage;
    use crate::random::SeededRandom;
    use async_trait::async_trait;

    struct EchoLlm;

    #[async_trait]
    impl LlmActor for EchoLlm {
        async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AppError> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(format!("You said: {}", last))
        }
    }

    async fn setup() -> (SupervisorHandle, SqlitePool) {
        let pool = init_db(None).await.unwrap();
        let handle = SupervisorHandle::start_with(
            Arc::new(AppConfig::default()),
            pool.clone(),
            Arc::new(EchoLlm),
            hotlines_for("US", "US"),
            Box::new(SeededRandom::new(1)),
            Box::new(SeededRandom::new(2)),
        )
        .await
        .unwrap();
        (handle, pool)
    }

    #[tokio::test]
    async fn test_turn_appends_and_persists() {
        let (handle, pool) = setup().await;
        let outcome = handle
            .process_message("I feel so anxious about work".to_string())
            .await
            .unwrap();
        assert_eq!(
            outcome.reply,
            Reply::Model("You said: I feel so anxious about work".to_string())
        );
        assert_eq!(outcome.session_depth, 1);

        let conversation = handle.conversation().await.unwrap();
        assert_eq!(conversation.len(), 2);
        assert!(conversation[0].analysis.is_some());

        let stored: Vec<Message> = database::load_record(&pool, RecordKey::Conversation)
            .await
            .unwrap();
        let ids = |m: &[Message]| m.iter().map(|m| m.id).collect::<Vec<_>>();
        assert_eq!(ids(&stored), ids(&conversation));
        assert_eq!(handle.mood_history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_entry_rejected_without_advancing() {
        let (handle, _pool) = setup().await;
        assert!(matches!(
            handle.process_message("   ".to_string()).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(handle.session_state().await.unwrap().session_depth, 0);
    }

    #[tokio::test]
    async fn test_theme_round_trip() {
        let (handle, pool) = setup().await;
        assert_eq!(handle.theme().await.unwrap(), Theme::Light);
        handle.set_theme(Theme::Dark).await.unwrap();
        assert_eq!(handle.theme().await.unwrap(), Theme::Dark);
        let stored: Theme = database::load_record(&pool, RecordKey::Theme).await.unwrap();
        assert_eq!(stored, Theme::Dark);
    }
}
