use crate::actors::messages::{AppError, LlmMessage};
use crate::actors::traits::LlmActor;
use crate::config::AppConfig;
use crate::models::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Slack on top of the HTTP timeout before the handle gives up on the actor.
const REPLY_GRACE: Duration = Duration::from_secs(5);

/// A handle to the `LlmActor`.
///
/// This struct provides a public, cloneable interface for sending messages to the
/// running chat actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct LlmActorHandle {
    sender: mpsc::Sender<LlmMessage>,
    reply_timeout: Duration,
}

impl LlmActorHandle {
    /// Spawns the actor on the current Tokio runtime.
    pub fn new(config: Arc<AppConfig>) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let reply_timeout = Duration::from_secs(config.request_timeout_secs) + REPLY_GRACE;
        let actor = LlmActorRunner::new(receiver, config);
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            reply_timeout,
        }
    }
}

#[async_trait]
impl LlmActor for LlmActorHandle {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::Complete {
            messages,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|e| AppError::Actor(e.to_string()))?;
        timeout(self.reply_timeout, recv).await??
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

// --- Actor Runner (Internal Logic) ---
struct LlmActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    client: Client,
    config: Arc<AppConfig>,
}

impl LlmActorRunner {
    fn new(receiver: mpsc::Receiver<LlmMessage>, config: Arc<AppConfig>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        Self {
            receiver,
            client,
            config,
        }
    }

    async fn run(mut self) {
        info!("LlmActor started");
        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }
        info!("LlmActor stopped");
    }

    async fn handle_message(&mut self, msg: LlmMessage) {
        match msg {
            LlmMessage::Complete {
                messages,
                mut responder,
            } => {
                // A caller that stops waiting (abort or timeout) drops the request too.
                let result = tokio::select! {
                    result = self.complete(&messages) => Some(result),
                    _ = responder.closed() => None,
                };
                match result {
                    Some(result) => {
                        let _ = responder.send(result);
                    }
                    None => debug!("Completion abandoned by caller"),
                }
            }
        }
    }

    #[instrument(skip(self, messages), fields(count = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        // Refused locally: no credential, no request.
        let Some(api_key) = self.config.chat_api_key.as_deref() else {
            return Err(AppError::Config(
                "No chat service credential configured".to_string(),
            ));
        };

        let payload = CompletionRequest {
            model: &self.config.chat_model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let res = self
            .client
            .post(&self.config.chat_endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Actor(format!(
                "Completion request failed with status {}: {}",
                status, body
            )));
        }

        let body: CompletionResponse = res
            .json()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed completion body: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::Validation("Completion response has no message content".to_string())
            })?;

        debug!(chars = content.len(), "Completion received");
        Ok(content)
    }
}
