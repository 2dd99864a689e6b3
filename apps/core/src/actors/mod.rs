//! # Actors
//!
//! - `llm`: chat-completion client running as its own task
//! - `orchestrator`: one conversational turn, from user text to reply
//! - `supervisor`: owns the per-client records and serializes turns
//! - `messages`: mailbox message types
//! - `traits`: the `LlmActor` seam

pub mod llm;
pub mod messages;
pub mod orchestrator;
pub mod supervisor;
pub mod traits;
