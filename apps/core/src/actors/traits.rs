use async_trait::async_trait;

use crate::error::AppError;
use crate::models::ChatMessage;

/// Defines the public interface for the chat-completion service.
///
/// The orchestrator only sees this trait, so the remote API can be swapped
/// for a local model or a test double.
#[async_trait]
pub trait LlmActor: Send + Sync + 'static {
    /// Sends an ordered role/content list and returns the reply text.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AppError>;
}
