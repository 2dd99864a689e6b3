//! Word-list sentiment scoring.

use std::collections::HashSet;

use super::analysis::{Sentiment, SentimentLabel};
use super::lexicon::Lexicon;

/// Sentiment scorer over lower-cased word tokens.
pub struct SentimentScorer {
    positive: HashSet<String>,
    negative: HashSet<String>,
    intensifiers: HashSet<String>,
}

impl SentimentScorer {
    pub fn new(lexicon: &Lexicon) -> Self {
        Self {
            positive: lexicon.positive.iter().cloned().collect(),
            negative: lexicon.negative.iter().cloned().collect(),
            intensifiers: lexicon.intensifiers.iter().cloned().collect(),
        }
    }

    /// Scores already tokenized, lower-cased words.
    pub fn score(&self, tokens: &[String]) -> Sentiment {
        let total = tokens.len();
        if total == 0 {
            return Sentiment::default();
        }

        let mut positive = 0usize;
        let mut negative = 0usize;
        let mut intensifiers = 0usize;
        for token in tokens {
            if self.positive.contains(token) {
                positive += 1;
            } else if self.negative.contains(token) {
                negative += 1;
            }
            if self.intensifiers.contains(token) {
                intensifiers += 1;
            }
        }

        let sentiment_words = positive + negative;
        let score = if sentiment_words > 0 {
            (positive as f64 - negative as f64) / sentiment_words as f64
        } else {
            0.0
        };
        let total = total as f64;
        let magnitude = (sentiment_words as f64 / total) * (1.0 + intensifiers as f64 / total);

        Sentiment {
            score,
            magnitude,
            label: SentimentLabel::from_score(score),
        }
    }
}
