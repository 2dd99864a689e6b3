//! Keyword-substring emotion intensities.

use super::analysis::{empty_emotions, EmotionScores};
use super::lexicon::{EmotionKeywords, Lexicon};

/// Intensity added for each matched keyword.
const KEYWORD_WEIGHT: f64 = 0.2;

pub struct EmotionDetector {
    table: Vec<EmotionKeywords>,
}

impl EmotionDetector {
    pub fn new(lexicon: &Lexicon) -> Self {
        Self {
            table: lexicon.emotions.clone(),
        }
    }

    /// Scores every emotion against the lower-cased text.
    ///
    /// Matching is by substring, not word boundary, so "sadly" counts for "sad".
    pub fn detect(&self, text_lower: &str) -> EmotionScores {
        let mut scores = empty_emotions();
        for entry in &self.table {
            let hits = entry
                .keywords
                .iter()
                .filter(|k| text_lower.contains(k.as_str()))
                .count();
            let intensity = (hits as f64 * KEYWORD_WEIGHT).min(1.0);
            let slot = scores.entry(entry.emotion).or_insert(0.0);
            *slot = (*slot + intensity).min(1.0);
        }
        scores
    }
}
