//! Keyword tables driving the lexical analysis.
//!
//! The tables are plain data: the scorers never hard-code a word. A localized
//! lexicon can be supplied as JSON through [`Lexicon::from_json`].

use serde::{Deserialize, Serialize};

use super::analysis::Emotion;
use crate::error::AppError;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "happy", "joy", "love", "wonderful", "amazing", "excellent",
    "fantastic", "glad", "grateful", "thankful", "excited", "hopeful", "calm",
    "peaceful", "proud", "better", "nice", "relaxed", "confident", "content",
    "beautiful", "fun", "enjoy", "enjoyed", "pleased", "awesome", "positive",
    "optimistic", "blessed", "cheerful", "delighted", "satisfied", "safe",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "sad", "angry", "upset", "terrible", "awful", "horrible", "hate",
    "anxious", "worried", "depressed", "lonely", "tired", "exhausted", "stressed",
    "afraid", "scared", "hurt", "miserable", "hopeless", "worthless", "frustrated",
    "annoyed", "overwhelmed", "nervous", "guilty", "ashamed", "empty", "broken",
    "lost", "worse", "pain", "cry", "crying", "negative", "sick",
];

const INTENSIFIERS: &[&str] = &[
    "very", "really", "so", "extremely", "incredibly", "totally", "completely",
    "absolutely", "deeply", "truly", "too", "super", "utterly", "terribly",
];

const ANXIETY_KEYWORDS: &[&str] = &[
    "anxious", "anxiety", "worried", "worry", "nervous", "panic", "stress",
    "overwhelm", "tense", "uneasy", "restless", "on edge",
];

const SADNESS_KEYWORDS: &[&str] = &[
    "sad", "depressed", "unhappy", "lonely", "hopeless", "cry", "tears",
    "miserable", "empty", "heartbroken", "down", "blue",
];

const ANGER_KEYWORDS: &[&str] = &[
    "angry", "mad", "furious", "annoyed", "frustrated", "irritated", "rage",
    "hate", "resent", "pissed",
];

const FEAR_KEYWORDS: &[&str] = &[
    "afraid", "scared", "fear", "terrified", "frightened", "dread", "phobia",
    "threatened",
];

const JOY_KEYWORDS: &[&str] = &[
    "happy", "joy", "glad", "excited", "grateful", "cheerful", "delighted",
    "content", "love", "wonderful",
];

const SURPRISE_KEYWORDS: &[&str] = &[
    "surprised", "shocked", "amazed", "unexpected", "astonished", "sudden",
    "startled",
];

const DISGUST_KEYWORDS: &[&str] = &[
    "disgusted", "gross", "revolted", "sick of", "nauseated", "repulsed",
    "appalled",
];

const TRUST_KEYWORDS: &[&str] = &[
    "trust", "safe", "confident", "secure", "rely", "faith", "believe",
    "supported",
];

const WORK_KEYWORDS: &[&str] = &[
    "work", "job", "boss", "career", "office", "colleague", "coworker",
    "deadline", "meeting", "promotion", "project",
];

const RELATIONSHIP_KEYWORDS: &[&str] = &[
    "relationship", "partner", "boyfriend", "girlfriend", "husband", "wife",
    "dating", "breakup", "friend", "marriage",
];

const FAMILY_KEYWORDS: &[&str] = &[
    "family", "mother", "father", "mom", "dad", "parent", "sister", "brother",
    "child", "kids", "son", "daughter",
];

const HEALTH_KEYWORDS: &[&str] = &[
    "health", "sick", "illness", "doctor", "pain", "hospital", "exercise",
    "diet", "medication", "therapy",
];

const SLEEP_KEYWORDS: &[&str] = &[
    "sleep", "insomnia", "tired", "exhausted", "nightmare", "rest", "awake",
    "bed",
];

const EDUCATION_KEYWORDS: &[&str] = &[
    "school", "exam", "study", "class", "college", "university", "homework",
    "grade", "teacher",
];

const FINANCE_KEYWORDS: &[&str] = &[
    "money", "debt", "bills", "rent", "salary", "finance", "budget", "loan",
    "afford",
];

const SELF_ESTEEM_KEYWORDS: &[&str] = &[
    "worthless", "failure", "not good enough", "confidence", "ugly", "stupid",
    "myself", "insecure",
];

const FUTURE_KEYWORDS: &[&str] = &[
    "future", "plan", "goal", "dream", "tomorrow", "next year", "someday",
    "uncertain",
];

const LOSS_KEYWORDS: &[&str] = &[
    "loss", "died", "death", "passed away", "funeral", "grief", "miss them",
    "gone forever",
];

/// Keyword list for one emotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionKeywords {
    pub emotion: Emotion,
    pub keywords: Vec<String>,
}

/// Keyword list for one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicKeywords {
    pub topic: String,
    pub keywords: Vec<String>,
}

/// Complete set of lookup tables used by the analyzer.
///
/// All keywords are expected lower-case; [`Lexicon::from_json`] normalizes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub intensifiers: Vec<String>,
    pub emotions: Vec<EmotionKeywords>,
    pub topics: Vec<TopicKeywords>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for Lexicon {
    fn default() -> Self {
        let emotions = [
            (Emotion::Anxiety, ANXIETY_KEYWORDS),
            (Emotion::Sadness, SADNESS_KEYWORDS),
            (Emotion::Anger, ANGER_KEYWORDS),
            (Emotion::Fear, FEAR_KEYWORDS),
            (Emotion::Joy, JOY_KEYWORDS),
            (Emotion::Surprise, SURPRISE_KEYWORDS),
            (Emotion::Disgust, DISGUST_KEYWORDS),
            (Emotion::Trust, TRUST_KEYWORDS),
        ]
        .into_iter()
        .map(|(emotion, words)| EmotionKeywords {
            emotion,
            keywords: owned(words),
        })
        .collect();

        let topics = [
            ("work", WORK_KEYWORDS),
            ("relationships", RELATIONSHIP_KEYWORDS),
            ("family", FAMILY_KEYWORDS),
            ("health", HEALTH_KEYWORDS),
            ("sleep", SLEEP_KEYWORDS),
            ("education", EDUCATION_KEYWORDS),
            ("finances", FINANCE_KEYWORDS),
            ("self_esteem", SELF_ESTEEM_KEYWORDS),
            ("future", FUTURE_KEYWORDS),
            ("loss", LOSS_KEYWORDS),
        ]
        .into_iter()
        .map(|(topic, words)| TopicKeywords {
            topic: topic.to_string(),
            keywords: owned(words),
        })
        .collect();

        Self {
            positive: owned(POSITIVE_WORDS),
            negative: owned(NEGATIVE_WORDS),
            intensifiers: owned(INTENSIFIERS),
            emotions,
            topics,
        }
    }
}

impl Lexicon {
    /// Parses a lexicon from JSON, lower-casing every keyword.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let mut lexicon: Lexicon = serde_json::from_str(json)?;
        lexicon.normalize();
        Ok(lexicon)
    }

    fn normalize(&mut self) {
        let lower = |words: &mut Vec<String>| {
            for w in words.iter_mut() {
                *w = w.to_lowercase();
            }
        };
        lower(&mut self.positive);
        lower(&mut self.negative);
        lower(&mut self.intensifiers);
        for entry in &mut self.emotions {
            lower(&mut entry.keywords);
        }
        for entry in &mut self.topics {
            lower(&mut entry.keywords);
        }
    }

    /// Names of every topic in table order.
    pub fn topic_names(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.topic.as_str()).collect()
    }
}
