//! Text Analysis - Output structure for the lexical analyzer.
//!
//! Everything the analyzer learns about a single user entry. Created fresh each
//! turn; only the most recent copy is kept on the session for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The fixed emotion vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Anxiety,
    Sadness,
    Anger,
    Fear,
    Joy,
    Surprise,
    Disgust,
    Trust,
}

impl Emotion {
    pub const ALL: [Emotion; 8] = [
        Emotion::Anxiety,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Joy,
        Emotion::Surprise,
        Emotion::Disgust,
        Emotion::Trust,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Anxiety => "anxiety",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Joy => "joy",
            Emotion::Surprise => "surprise",
            Emotion::Disgust => "disgust",
            Emotion::Trust => "trust",
        }
    }

    /// Emotions that may become a tracked concern on the user profile.
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            Emotion::Anxiety | Emotion::Sadness | Emotion::Anger | Emotion::Fear | Emotion::Disgust
        )
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Emotion {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| e.label() == wanted)
            .ok_or_else(|| crate::error::AppError::Validation(format!("Unknown emotion: {}", s)))
    }
}

/// Emotion intensities, always holding all eight emotions.
pub type EmotionScores = BTreeMap<Emotion, f64>;

/// Returns a score map with every emotion at zero.
pub fn empty_emotions() -> EmotionScores {
    Emotion::ALL.iter().map(|e| (*e, 0.0)).collect()
}

/// Five-step sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
}

impl SentimentLabel {
    pub fn from_score(score: f64) -> Self {
        if score <= -0.6 {
            SentimentLabel::VeryNegative
        } else if score <= -0.2 {
            SentimentLabel::Negative
        } else if score >= 0.6 {
            SentimentLabel::VeryPositive
        } else if score >= 0.2 {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Polarity in `[-1, 1]`.
    pub score: f64,
    /// Share of sentiment-bearing words, boosted by intensifiers. Never negative.
    pub magnitude: f64,
    pub label: SentimentLabel,
}

impl Default for Sentiment {
    fn default() -> Self {
        Self {
            score: 0.0,
            magnitude: 0.0,
            label: SentimentLabel::Neutral,
        }
    }
}

/// Readability-style metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ComplexityMetrics {
    pub avg_word_length: f64,
    pub avg_sentence_length: f64,
    pub sentence_count: usize,
    /// Unclamped blend; can leave `[0, 1]` on degenerate inputs.
    pub raw_score: f64,
    /// `raw_score` clamped to `[0, 1]`.
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Person,
}

/// A capitalized word assumed to name someone. Heuristic only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub kind: EntityKind,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPhrase {
    pub text: String,
    pub relevance: f64,
}

/// Complete result of analyzing one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnalysis {
    pub sentiment: Sentiment,
    pub emotions: EmotionScores,
    /// Matched topics, in lexicon order, without duplicates.
    pub topics: Vec<String>,
    pub token_count: usize,
    pub complexity: ComplexityMetrics,
    /// Informational only.
    pub entities: Vec<Entity>,
    /// Informational only.
    pub key_phrases: Vec<KeyPhrase>,
    pub analyzed_at: DateTime<Utc>,
}

impl Default for TextAnalysis {
    fn default() -> Self {
        Self {
            sentiment: Sentiment::default(),
            emotions: empty_emotions(),
            topics: vec![],
            token_count: 0,
            complexity: ComplexityMetrics::default(),
            entities: vec![],
            key_phrases: vec![],
            analyzed_at: Utc::now(),
        }
    }
}

impl TextAnalysis {
    pub fn emotion(&self, emotion: Emotion) -> f64 {
        self.emotions.get(&emotion).copied().unwrap_or(0.0)
    }

    /// Emotions with a non-zero intensity, strongest first.
    pub fn detected_emotions(&self) -> Vec<(Emotion, f64)> {
        let mut found: Vec<(Emotion, f64)> = self
            .emotions
            .iter()
            .filter(|(_, v)| **v > 0.0)
            .map(|(e, v)| (*e, *v))
            .collect();
        found.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        found
    }

    /// Get a summary for logging
    pub fn summary(&self) -> String {
        format!(
            "Sentiment: {:?} ({:.2}), Topics: [{}], Tokens: {}, Complexity: {:.2}",
            self.sentiment.label,
            self.sentiment.score,
            self.topics.join(", "),
            self.token_count,
            self.complexity.score,
        )
    }
}
