//! Reduces the analyzer's emotion scores to the session's coarse categories.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::brain::{Emotion, TextAnalysis};

/// Coarse emotional category used to steer the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionCategory {
    Anxiety,
    Depression,
    Anger,
    Grief,
    Joy,
    Confusion,
    Neutral,
}

impl EmotionCategory {
    pub fn label(&self) -> &'static str {
        match self {
            EmotionCategory::Anxiety => "anxiety",
            EmotionCategory::Depression => "depression",
            EmotionCategory::Anger => "anger",
            EmotionCategory::Grief => "grief",
            EmotionCategory::Joy => "joy",
            EmotionCategory::Confusion => "confusion",
            EmotionCategory::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const ANXIETY_CUES: &[&str] = &["anxious", "panic", "worried", "nervous", "overwhelmed"];
const DEPRESSION_CUES: &[&str] = &["depressed", "hopeless", "worthless", "numb", "empty inside"];
const ANGER_CUES: &[&str] = &["angry", "furious", "rage", "pissed off"];
const GRIEF_CUES: &[&str] = &[
    "grief", "grieving", "passed away", "died", "funeral", "mourning", "lost my", "miss them",
];
const JOY_CUES: &[&str] = &["happy", "grateful", "excited", "proud"];
const CONFUSION_CUES: &[&str] = &[
    "confused", "don't know", "dont know", "not sure", "unsure", "can't decide", "uncertain",
];

fn any_cue(text_lower: &str, cues: &[&str]) -> bool {
    cues.iter().any(|c| text_lower.contains(c))
}

/// Categories for this turn, in fixed order; `[Neutral]` when nothing fires.
pub fn classify_emotions(text: &str, analysis: &TextAnalysis) -> Vec<EmotionCategory> {
    let lower = text.to_lowercase();
    let mut found = Vec::new();

    if analysis.emotion(Emotion::Anxiety) >= 0.2
        || analysis.emotion(Emotion::Fear) >= 0.4
        || any_cue(&lower, ANXIETY_CUES)
    {
        found.push(EmotionCategory::Anxiety);
    }
    if analysis.emotion(Emotion::Sadness) >= 0.4 || any_cue(&lower, DEPRESSION_CUES) {
        found.push(EmotionCategory::Depression);
    }
    if analysis.emotion(Emotion::Anger) >= 0.4 || any_cue(&lower, ANGER_CUES) {
        found.push(EmotionCategory::Anger);
    }
    if any_cue(&lower, GRIEF_CUES) {
        found.push(EmotionCategory::Grief);
    }
    if analysis.emotion(Emotion::Joy) >= 0.4 || any_cue(&lower, JOY_CUES) {
        found.push(EmotionCategory::Joy);
    }
    if any_cue(&lower, CONFUSION_CUES) {
        found.push(EmotionCategory::Confusion);
    }

    if found.is_empty() {
        found.push(EmotionCategory::Neutral);
    }
    found
}
