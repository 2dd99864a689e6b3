//! Actor System Tests
//!
//! The chat actor against a mock HTTP server, the orchestrator wired to it, and
//! the supervisor's turn handling with scripted chat backends.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::actors::llm::LlmActorHandle;
use crate::actors::orchestrator::{
    Reply, ResponseOrchestrator, FALLBACK_NO_CREDENTIAL, FALLBACK_REMOTE_FAILURE,
};
use crate::actors::supervisor::SupervisorHandle;
use crate::actors::traits::LlmActor;
use crate::brain::Emotion;
use crate::config::AppConfig;
use crate::database::{init_db, load_record, RecordKey};
use crate::error::AppError;
use crate::geo::hotlines_for;
use crate::models::{ChatMessage, Role};
use crate::mood::EmotionEntry;
use crate::profile::UserProfile;
use crate::random::SeededRandom;
use crate::resources::ResourceKind;
use crate::session::{SessionMachine, SessionState};

/// Replies with a fixed line and counts calls.
struct ScriptedLlm {
    reply: String,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmActor for ScriptedLlm {
    async fn complete(&self, _messages: Vec<ChatMessage>) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Hangs on any entry mentioning "slow" until aborted; answers everything else.
struct SlowLlm {
    started: Notify,
}

#[async_trait]
impl LlmActor for SlowLlm {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AppError> {
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        if last.contains("slow") {
            self.started.notify_one();
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Ok(format!("Heard: {}", last))
    }
}

fn remote_config(server_uri: &str, api_key: Option<&str>) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        chat_api_key: api_key.map(str::to_string),
        chat_endpoint: format!("{}/v1/chat/completions", server_uri),
        request_timeout_secs: 5,
        ..AppConfig::default()
    })
}

async fn supervisor_with<L: LlmActor>(llm: Arc<L>) -> SupervisorHandle {
    let pool = init_db(None).await.unwrap();
    SupervisorHandle::start_with(
        Arc::new(AppConfig::default()),
        pool,
        llm,
        hotlines_for("US", "US"),
        Box::new(SeededRandom::new(1)),
        Box::new(SeededRandom::new(2)),
    )
    .await
    .unwrap()
}

#[cfg(test)]
mod orchestrator_tests {
    use super::*;

    fn orchestrator(config: Arc<AppConfig>) -> ResponseOrchestrator<LlmActorHandle> {
        ResponseOrchestrator::new(
            Arc::new(LlmActorHandle::new(config.clone())),
            SessionMachine::default(),
            config,
            hotlines_for("US", "US"),
        )
    }

    #[tokio::test]
    async fn test_turn_through_http_chat_service() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "What made today hard?"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let orch = orchestrator(remote_config(&mock_server.uri(), Some("sk-test")));
        let (reply, state) = orch
            .respond("Work was rough today", &SessionState::default(), &[])
            .await;

        assert_eq!(reply, Reply::Model("What made today hard?".to_string()));
        assert_eq!(state.last_question_type.as_deref(), Some("open"));
        assert_eq!(state.recent_topics, vec!["work"]);
    }

    #[tokio::test]
    async fn test_server_error_becomes_fallback() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let orch = orchestrator(remote_config(&mock_server.uri(), Some("sk-test")));
        let (reply, state) = orch.respond("hello", &SessionState::default(), &[]).await;
        assert_eq!(reply, Reply::Fallback(FALLBACK_REMOTE_FAILURE.to_string()));
        assert_eq!(state.session_depth, 1);
        assert_eq!(state.last_question_type, None);
    }

    #[tokio::test]
    async fn test_missing_credential_becomes_fallback() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let orch = orchestrator(remote_config(&mock_server.uri(), None));
        let (reply, _) = orch.respond("hello", &SessionState::default(), &[]).await;
        assert_eq!(reply, Reply::Fallback(FALLBACK_NO_CREDENTIAL.to_string()));
    }

    #[tokio::test]
    async fn test_crisis_makes_no_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let orch = orchestrator(remote_config(&mock_server.uri(), Some("sk-test")));
        let (reply, state) = orch
            .respond("I keep thinking about suicide", &SessionState::default(), &[])
            .await;
        assert!(matches!(reply, Reply::Safety(_)));
        assert!(state.crisis_detected());
    }
}

#[cfg(test)]
mod supervisor_tests {
    use super::*;

    #[tokio::test]
    async fn test_new_entry_supersedes_pending_turn() {
        let llm = Arc::new(SlowLlm {
            started: Notify::new(),
        });
        let handle = supervisor_with(llm.clone()).await;

        let first = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.process_message("a slow one".to_string()).await })
        };
        llm.started.notified().await;

        let second = handle
            .process_message("and another".to_string())
            .await
            .unwrap();
        let first = first.await.unwrap().unwrap();

        assert_eq!(first.reply, Reply::Abandoned);
        assert_eq!(first.session_depth, 1);
        assert_eq!(second.reply, Reply::Model("Heard: and another".to_string()));
        assert_eq!(second.session_depth, 2);

        // abandoned turn keeps its user message but has no reply
        let conversation = handle.conversation().await.unwrap();
        let roles: Vec<Role> = conversation.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_superseded_http_call_does_not_delay_next_turn() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("and another"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Tell me more."}}]
            })))
            .with_priority(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("a slow one"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"choices": [{"message": {"content": "late"}}]}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let config = remote_config(&mock_server.uri(), Some("sk-test"));
        let handle = SupervisorHandle::start_with(
            config.clone(),
            init_db(None).await.unwrap(),
            Arc::new(LlmActorHandle::new(config)),
            hotlines_for("US", "US"),
            Box::new(SeededRandom::new(1)),
            Box::new(SeededRandom::new(2)),
        )
        .await
        .unwrap();

        let first = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.process_message("a slow one".to_string()).await })
        };
        // wait until the slow request is on the wire
        while mock_server
            .received_requests()
            .await
            .map_or(true, |requests| requests.is_empty())
        {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let started = Instant::now();
        let second = handle
            .process_message("and another".to_string())
            .await
            .unwrap();
        let elapsed = started.elapsed();
        let first = first.await.unwrap().unwrap();

        assert_eq!(first.reply, Reply::Abandoned);
        assert_eq!(second.reply, Reply::Model("Tell me more.".to_string()));
        assert_eq!(second.session_depth, 2);
        assert!(
            elapsed < Duration::from_secs(2),
            "second turn waited {:?} behind the abandoned request",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_cancel_reaches_a_queued_turn() {
        let llm = Arc::new(ScriptedLlm::new("ok"));
        let handle = supervisor_with(llm.clone()).await;

        let mut turn = Box::pin(handle.process_message("still here".to_string()));
        // one poll queues the turn without letting the supervisor pick it up
        assert!(futures::poll!(turn.as_mut()).is_pending());
        assert!(handle.cancel_pending().await);

        let outcome = turn.await.unwrap();
        assert_eq!(outcome.reply, Reply::Abandoned);
        assert_eq!(outcome.session_depth, 1);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert!(!handle.cancel_pending().await);
    }

    #[tokio::test]
    async fn test_cancel_pending_without_turn() {
        let handle = supervisor_with(Arc::new(ScriptedLlm::new("ok"))).await;
        assert!(!handle.cancel_pending().await);
    }

    #[tokio::test]
    async fn test_resource_on_sixth_turn() {
        let handle = supervisor_with(Arc::new(ScriptedLlm::new("I see."))).await;
        for turn in 1..=6u64 {
            let outcome = handle
                .process_message(format!("entry number {}", turn))
                .await
                .unwrap();
            assert_eq!(outcome.session_depth, turn);
            if turn == 6 {
                let resource = outcome.resource.expect("resource on turn 6");
                assert_ne!(resource.kind, ResourceKind::CrisisContact);
            } else {
                assert!(outcome.resource.is_none(), "turn {}", turn);
            }
        }
    }

    #[tokio::test]
    async fn test_crisis_turn_skips_chat_service() {
        let llm = Arc::new(ScriptedLlm::new("unused"));
        let handle = supervisor_with(llm.clone()).await;

        let outcome = handle
            .process_message("I just want to die".to_string())
            .await
            .unwrap();
        assert!(outcome.crisis);
        assert!(matches!(outcome.reply, Reply::Safety(ref t) if t.contains("988")));
        assert!(outcome.typing_delay >= Duration::from_secs(1));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);

        let conversation = handle.conversation().await.unwrap();
        assert_eq!(conversation.len(), 2);
        assert_eq!(Some(conversation[1].text.as_str()), outcome.reply.text());

        let outcome = handle.process_message("thanks".to_string()).await.unwrap();
        assert!(!outcome.crisis);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reset_keeps_mood_history_and_theme() {
        let handle = supervisor_with(Arc::new(ScriptedLlm::new("Go on."))).await;
        handle
            .process_message("I'm anxious about my exam".to_string())
            .await
            .unwrap();
        handle.set_theme(crate::models::Theme::Dark).await.unwrap();
        assert_eq!(handle.mood_history().await.unwrap().len(), 1);

        handle.reset_session().await.unwrap();

        assert_eq!(handle.session_state().await.unwrap(), SessionState::default());
        assert!(handle.conversation().await.unwrap().is_empty());
        assert_eq!(handle.mood_history().await.unwrap().len(), 1);
        assert_eq!(handle.theme().await.unwrap(), crate::models::Theme::Dark);
    }

    #[tokio::test]
    async fn test_clear_profile_keeps_depth() {
        let handle = supervisor_with(Arc::new(ScriptedLlm::new("Go on."))).await;
        for text in ["My boss is awful", "I can't pay the rent"] {
            handle.process_message(text.to_string()).await.unwrap();
        }
        let state = handle.session_state().await.unwrap();
        assert_ne!(state.user_profile, UserProfile::default());

        handle.clear_profile().await.unwrap();
        let state = handle.session_state().await.unwrap();
        assert_eq!(state.user_profile, UserProfile::default());
        assert_eq!(state.session_depth, 2);
        assert_eq!(handle.conversation().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_log_mood_drops_zero_levels() {
        let pool = init_db(None).await.unwrap();
        let handle = SupervisorHandle::start_with(
            Arc::new(AppConfig::default()),
            pool.clone(),
            Arc::new(ScriptedLlm::new("ok")),
            hotlines_for("US", "US"),
            Box::new(SeededRandom::new(1)),
            Box::new(SeededRandom::new(2)),
        )
        .await
        .unwrap();

        let levels = BTreeMap::from([(Emotion::Joy, 0.6), (Emotion::Anger, 0.0)]);
        let entry = handle
            .log_mood(levels, Some("walk in the park".to_string()))
            .await
            .unwrap();
        assert_eq!(entry.emotions.len(), 1);
        assert_eq!(entry.dominant(), Some(Emotion::Joy));

        let stored: Vec<EmotionEntry> = load_record(&pool, RecordKey::MoodHistory).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].note.as_deref(), Some("walk in the park"));
    }

    #[tokio::test]
    async fn test_neutral_turn_adds_no_mood_entry() {
        let handle = supervisor_with(Arc::new(ScriptedLlm::new("ok"))).await;
        handle.process_message("Nothing much.".to_string()).await.unwrap();
        assert!(handle.mood_history().await.unwrap().is_empty());
        assert_eq!(handle.conversation().await.unwrap().len(), 2);
    }
}
