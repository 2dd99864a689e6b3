//! Text Complexity Scoring.
//!
//! Blends average word length and average sentence length into a single score.
//! The blend is reported both raw and clamped to `[0, 1]`: very short words
//! push it below zero and run-on sentences push it above one.

use super::analysis::ComplexityMetrics;

/// Word length contributing nothing.
const BASE_WORD_LENGTH: f64 = 3.0;
/// Word length span mapped onto `[0, 1]`.
const WORD_LENGTH_SPAN: f64 = 5.0;
const BASE_SENTENCE_LENGTH: f64 = 5.0;
const SENTENCE_LENGTH_SPAN: f64 = 20.0;

const WORD_LENGTH_WEIGHT: f64 = 0.6;
const SENTENCE_LENGTH_WEIGHT: f64 = 0.4;

/// Complexity scorer for text analysis
#[derive(Default)]
pub struct ComplexityScorer;

impl ComplexityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Splits on `.`, `!` and `?`, dropping empty fragments.
    pub fn sentences(text: &str) -> Vec<&str> {
        text.split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Analyze text given its word tokens.
    pub fn analyze(&self, text: &str, tokens: &[String]) -> ComplexityMetrics {
        if tokens.is_empty() {
            return ComplexityMetrics::default();
        }

        let word_count = tokens.len() as f64;
        let total_chars: usize = tokens.iter().map(|w| w.chars().count()).sum();
        let avg_word_length = total_chars as f64 / word_count;

        let sentence_count = Self::sentences(text).len();
        let avg_sentence_length = if sentence_count == 0 {
            0.0
        } else {
            word_count / sentence_count as f64
        };

        let word_score = (avg_word_length - BASE_WORD_LENGTH) / WORD_LENGTH_SPAN;
        let sentence_score = (avg_sentence_length - BASE_SENTENCE_LENGTH) / SENTENCE_LENGTH_SPAN;
        let raw_score = word_score * WORD_LENGTH_WEIGHT + sentence_score * SENTENCE_LENGTH_WEIGHT;

        ComplexityMetrics {
            avg_word_length,
            avg_sentence_length,
            sentence_count,
            raw_score,
            score: raw_score.clamp(0.0, 1.0),
        }
    }
}
