//! Short-term conversational context and its per-turn transition.

use serde::{Deserialize, Serialize};

use super::approach::{select_approach, TherapyApproach};
use super::crisis::detect_crisis_phrase;
use super::emotions::{classify_emotions, EmotionCategory};
use crate::brain::TextAnalysis;
use crate::profile::{ProfileUpdater, UserProfile};

/// How many topic tags `recent_topics` keeps.
pub const RECENT_TOPICS_LIMIT: usize = 3;

/// Whether the current turn tripped a crisis phrase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Normal,
    Crisis {
        /// The phrase that matched.
        phrase: String,
    },
}

/// One user turn, already analyzed.
#[derive(Debug, Clone)]
pub struct TurnInput<'a> {
    pub text: &'a str,
    pub analysis: TextAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// This turn's categories; `[neutral]` when nothing was detected.
    pub dominant_emotions: Vec<EmotionCategory>,
    /// Most recent topic tags first, at most [`RECENT_TOPICS_LIMIT`].
    pub recent_topics: Vec<String>,
    pub approach_used: Vec<TherapyApproach>,
    /// Number of processed user turns. Only ever grows.
    pub session_depth: u64,
    pub mode: SessionMode,
    pub last_question_type: Option<String>,
    pub user_insights: Vec<String>,
    pub user_profile: UserProfile,
    pub last_analysis: Option<TextAnalysis>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            dominant_emotions: vec![EmotionCategory::Neutral],
            recent_topics: vec![],
            approach_used: vec![TherapyApproach::PersonCentered],
            session_depth: 0,
            mode: SessionMode::Normal,
            last_question_type: None,
            user_insights: vec![],
            user_profile: UserProfile::default(),
            last_analysis: None,
        }
    }
}

impl SessionState {
    pub fn crisis_detected(&self) -> bool {
        matches!(self.mode, SessionMode::Crisis { .. })
    }

    /// First category of the current turn.
    pub fn dominant_emotion(&self) -> EmotionCategory {
        self.dominant_emotions
            .first()
            .copied()
            .unwrap_or(EmotionCategory::Neutral)
    }

    /// Returns the state after one user turn; `self` is not modified.
    ///
    /// The depth counter moves first and unconditionally. Crisis mode is
    /// recomputed from this turn's text alone.
    pub fn advance(&self, input: &TurnInput<'_>) -> SessionState {
        let mut next = self.clone();
        next.session_depth += 1;

        next.dominant_emotions = classify_emotions(input.text, &input.analysis);

        next.mode = match detect_crisis_phrase(input.text) {
            Some(phrase) => SessionMode::Crisis {
                phrase: phrase.to_string(),
            },
            None => SessionMode::Normal,
        };

        // windowed by tag, not by turn: a busy turn can push out older turns entirely
        let mut topics = input.analysis.topics.clone();
        topics.extend(next.recent_topics.drain(..));
        topics.truncate(RECENT_TOPICS_LIMIT);
        next.recent_topics = topics;

        next.user_profile =
            ProfileUpdater::new().update(&self.user_profile, &input.analysis, input.text);

        next.approach_used = select_approach(&next.dominant_emotions);
        next.last_analysis = Some(input.analysis.clone());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn<'a>(text: &'a str, topics: &[&str]) -> TurnInput<'a> {
        TurnInput {
            text,
            analysis: TextAnalysis {
                topics: topics.iter().map(|t| t.to_string()).collect(),
                ..TextAnalysis::default()
            },
        }
    }

    #[test]
    fn test_depth_increments_once_per_turn() {
        let mut state = SessionState::default();
        for i in 1..=5 {
            state = state.advance(&turn("hello", &[]));
            assert_eq!(state.session_depth, i);
        }
    }

    #[test]
    fn test_crisis_is_recomputed_each_turn() {
        let state = SessionState::default().advance(&turn("I want to end my life.", &[]));
        assert!(state.crisis_detected());
        assert_eq!(
            state.mode,
            SessionMode::Crisis {
                phrase: "end my life".to_string()
            }
        );
        assert_eq!(state.session_depth, 1);

        let state = state.advance(&turn("thank you for listening", &[]));
        assert!(!state.crisis_detected());
        assert_eq!(state.session_depth, 2);
    }

    #[test]
    fn test_recent_topics_prepend_and_truncate() {
        let state = SessionState::default()
            .advance(&turn("", &["work"]))
            .advance(&turn("", &["family", "sleep"]));
        assert_eq!(state.recent_topics, vec!["family", "sleep", "work"]);

        let state = state.advance(&turn("", &["health", "finances", "loss"]));
        assert_eq!(state.recent_topics, vec!["health", "finances", "loss"]);
    }

    #[test]
    fn test_turn_without_topics_keeps_window() {
        let state = SessionState::default()
            .advance(&turn("", &["work"]))
            .advance(&turn("", &[]));
        assert_eq!(state.recent_topics, vec!["work"]);
    }

    #[test]
    fn test_advance_leaves_previous_state() {
        let before = SessionState::default();
        let snapshot = before.clone();
        let _ = before.advance(&turn("I'm so worried", &["work"]));
        assert_eq!(before, snapshot);
    }

    #[test]
    fn test_serialized_mode_is_tagged() {
        let state = SessionState::default().advance(&turn("suicide", &[]));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["mode"]["kind"], "crisis");
        assert_eq!(json["mode"]["phrase"], "suicide");
        assert_eq!(json["session_depth"], 1);

        let back: SessionState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
