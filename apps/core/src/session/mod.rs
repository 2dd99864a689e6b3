//! # Session Module
//!
//! Tracks short-term conversational context and advances it once per user turn.
//!
//! ## Components
//! - `crisis`: static crisis phrase detection
//! - `emotions`: coarse emotion categories for the turn
//! - `approach`: therapy-style approach tags
//! - `state`: `SessionState` and its transition

pub mod approach;
pub mod crisis;
pub mod emotions;
pub mod state;

use std::sync::Arc;
use tracing::{info, warn};

pub use approach::{select_approach, TherapyApproach};
pub use crisis::{detect_crisis_phrase, CRISIS_PHRASES};
pub use emotions::{classify_emotions, EmotionCategory};
pub use state::{SessionMode, SessionState, TurnInput, RECENT_TOPICS_LIMIT};

use crate::brain::LexicalAnalyzer;

/// Runs the analyzer and advances the session for one user turn.
#[derive(Clone)]
pub struct SessionMachine {
    analyzer: Arc<LexicalAnalyzer>,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new(Arc::new(LexicalAnalyzer::new()))
    }
}

impl SessionMachine {
    pub fn new(analyzer: Arc<LexicalAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Analyze `text` and return the next state. `state` is not modified.
    pub fn update_session_state(&self, state: &SessionState, text: &str) -> SessionState {
        let analysis = self.analyzer.analyze(text);
        let next = state.advance(&TurnInput { text, analysis });

        if let SessionMode::Crisis { phrase } = &next.mode {
            warn!(depth = next.session_depth, phrase = %phrase, "Crisis phrase detected");
        } else {
            info!(
                depth = next.session_depth,
                dominant = %next.dominant_emotion(),
                topics = ?next.recent_topics,
                "Session advanced"
            );
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anxious_about_work_scenario() {
        let machine = SessionMachine::default();
        let state = machine.update_session_state(
            &SessionState::default(),
            "I feel so anxious about work and can't sleep",
        );

        let analysis = state.last_analysis.as_ref().unwrap();
        assert!(analysis.topics.contains(&"work".to_string()));
        assert!(analysis.emotion(crate::brain::Emotion::Anxiety) > 0.0);
        assert!(state.dominant_emotions.contains(&EmotionCategory::Anxiety));
        assert_eq!(
            state.approach_used,
            vec![TherapyApproach::Cbt, TherapyApproach::Mindfulness]
        );
        assert!(!state.crisis_detected());
    }

    #[test]
    fn test_same_topic_three_turns() {
        let machine = SessionMachine::default();
        let mut state = SessionState::default();
        for _ in 0..3 {
            state = machine.update_session_state(&state, "My boss keeps piling on more");
        }
        assert!(state.recent_topics.len() <= RECENT_TOPICS_LIMIT);
        assert_eq!(state.recent_topics[0], "work");
        assert_eq!(state.session_depth, 3);
    }
}
