//! Lexical Analyzer - Main orchestrator for the Brain module.
//!
//! Runs every scorer over one entry and assembles a [`TextAnalysis`]. Apart
//! from key-phrase relevance, the result is a pure function of the text.

use chrono::Utc;
use std::sync::Mutex;
use std::time::Instant;
use tracing::debug;

use super::analysis::TextAnalysis;
use super::complexity::ComplexityScorer;
use super::emotions::EmotionDetector;
use super::keywords::KeywordExtractor;
use super::lexicon::Lexicon;
use super::sentiment::SentimentScorer;
use super::tokenize;
use super::topics::TopicExtractor;
use crate::random::{RandomSource, ThreadRandom};

/// Main analyzer that orchestrates all lexical scorers
pub struct LexicalAnalyzer {
    sentiment: SentimentScorer,
    emotions: EmotionDetector,
    topics: TopicExtractor,
    complexity: ComplexityScorer,
    keywords: KeywordExtractor,
    rng: Mutex<Box<dyn RandomSource>>,
}

impl Default for LexicalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalAnalyzer {
    /// Built-in lexicon, entropy-seeded key-phrase scoring.
    pub fn new() -> Self {
        Self::with_lexicon(&Lexicon::default(), Box::new(ThreadRandom::default()))
    }

    /// Built-in lexicon with a caller-supplied random source.
    pub fn with_random(rng: Box<dyn RandomSource>) -> Self {
        Self::with_lexicon(&Lexicon::default(), rng)
    }

    pub fn with_lexicon(lexicon: &Lexicon, rng: Box<dyn RandomSource>) -> Self {
        Self {
            sentiment: SentimentScorer::new(lexicon),
            emotions: EmotionDetector::new(lexicon),
            topics: TopicExtractor::new(lexicon),
            complexity: ComplexityScorer::new(),
            keywords: KeywordExtractor::new(),
            rng: Mutex::new(rng),
        }
    }

    /// Analyze one entry. Never fails, even on empty input.
    pub fn analyze(&self, text: &str) -> TextAnalysis {
        let start = Instant::now();
        let text_lower = text.to_lowercase();
        let tokens = tokenize(&text_lower);

        let key_phrases = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            self.keywords.key_phrases(text, rng.as_mut())
        };

        let analysis = TextAnalysis {
            sentiment: self.sentiment.score(&tokens),
            emotions: self.emotions.detect(&text_lower),
            topics: self.topics.extract(&text_lower),
            token_count: tokens.len(),
            complexity: self.complexity.analyze(text, &tokens),
            entities: self.keywords.entities(text),
            key_phrases,
            analyzed_at: Utc::now(),
        };

        debug!(
            elapsed_us = start.elapsed().as_micros() as u64,
            "{}",
            analysis.summary()
        );
        analysis
    }
}
