//! Entity and key-phrase extraction.
//!
//! Neither output feeds back into the profile or session; both are kept on the
//! analysis for display. Entities are capitalized words assumed to be people.
//! Key-phrase relevance is drawn from the injected random source.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::analysis::{Entity, EntityKind, KeyPhrase};
use super::complexity::ComplexityScorer;
use super::tokenize;
use crate::random::RandomSource;

// NOTE: expect() is acceptable for a static pattern that is known to compile.
static PROPER_NOUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][a-z]+").expect("Invalid regex: proper noun pattern"));

const MAX_ENTITIES: usize = 5;
const MAX_KEY_PHRASES: usize = 3;
const MIN_PHRASE_TOKENS: usize = 3;
const MAX_PHRASE_TOKENS: usize = 10;
const RELEVANCE_LOW: f64 = 0.5;
const RELEVANCE_HIGH: f64 = 0.8;

#[derive(Default)]
pub struct KeywordExtractor;

impl KeywordExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Top capitalized words by frequency, first appearance breaking ties.
    pub fn entities(&self, text: &str) -> Vec<Entity> {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for m in PROPER_NOUN.find_iter(text) {
            let word = m.as_str();
            let count = counts.entry(word).or_insert(0);
            if *count == 0 {
                order.push(word);
            }
            *count += 1;
        }

        let mut entities: Vec<Entity> = order
            .into_iter()
            .map(|word| Entity {
                text: word.to_string(),
                kind: EntityKind::Person,
                count: counts.get(word).copied().unwrap_or(0),
            })
            .collect();
        // stable sort keeps first-seen order among equal counts
        entities.sort_by(|a, b| b.count.cmp(&a.count));
        entities.truncate(MAX_ENTITIES);
        entities
    }

    /// Mid-length sentences with a random relevance, best three kept.
    pub fn key_phrases(&self, text: &str, rng: &mut dyn RandomSource) -> Vec<KeyPhrase> {
        let mut phrases: Vec<KeyPhrase> = ComplexityScorer::sentences(text)
            .into_iter()
            .filter(|s| {
                let n = tokenize(s).len();
                (MIN_PHRASE_TOKENS..=MAX_PHRASE_TOKENS).contains(&n)
            })
            .map(|s| KeyPhrase {
                text: s.to_string(),
                relevance: rng.range(RELEVANCE_LOW, RELEVANCE_HIGH),
            })
            .collect();

        phrases.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        phrases.truncate(MAX_KEY_PHRASES);
        phrases
    }
}
