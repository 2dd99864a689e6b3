//! # Brain Module
//!
//! Fast, non-LLM lexical analysis for Haven.
//! Runs on every user entry BEFORE the conversation is sent to the chat service.
//!
//! ## Components
//! - `lexicon`: keyword tables (sentiment, emotions, topics)
//! - `sentiment`: word-list polarity and magnitude
//! - `emotions`: keyword-substring emotion intensities
//! - `topics`: topic tagging
//! - `complexity`: word/sentence length complexity
//! - `keywords`: entities and key phrases
//! - `analysis`: output data structure
//! - `analyzer`: main orchestrator

pub mod analysis;
pub mod analyzer;
pub mod complexity;
pub mod emotions;
pub mod keywords;
pub mod lexicon;
pub mod sentiment;
pub mod topics;

use regex::Regex;
use std::sync::LazyLock;

pub use analysis::{
    ComplexityMetrics, Emotion, EmotionScores, Entity, EntityKind, KeyPhrase, Sentiment,
    SentimentLabel, TextAnalysis,
};
pub use analyzer::LexicalAnalyzer;
pub use lexicon::Lexicon;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("Invalid regex: word pattern"));

/// Lower-cased word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD.find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}
