//! Haven core: a journaling companion that listens, reflects and points to help.
//!
//! A user turn flows through the lexical analyzer ([`brain`]), folds into the
//! session and profile ([`session`], [`profile`]), and is answered by the
//! response orchestrator ([`actors::orchestrator`]). The supervisor actor owns
//! the persisted records and runs turns one at a time.

pub mod actors;
pub mod brain;
pub mod config;
pub mod database;
pub mod error;
pub mod fs_manager;
pub mod geo;
pub mod models;
pub mod mood;
pub mod profile;
pub mod random;
pub mod resources;
pub mod session;
pub mod telemetry;
pub mod voice;

pub use actors::orchestrator::Reply;
pub use actors::supervisor::{SupervisorHandle, TurnOutcome};
pub use config::AppConfig;
pub use error::AppError;

#[cfg(test)]
mod tests;
