//! Topic tagging by keyword substring.

use super::lexicon::{Lexicon, TopicKeywords};

pub struct TopicExtractor {
    table: Vec<TopicKeywords>,
}

impl TopicExtractor {
    pub fn new(lexicon: &Lexicon) -> Self {
        Self {
            table: lexicon.topics.clone(),
        }
    }

    /// Every topic with at least one keyword anywhere in the lower-cased text.
    pub fn extract(&self, text_lower: &str) -> Vec<String> {
        self.table
            .iter()
            .filter(|t| t.keywords.iter().any(|k| text_lower.contains(k.as_str())))
            .map(|t| t.topic.clone())
            .collect()
    }
}
