//! Mood history: what the user felt, turn by turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::brain::{Emotion, EmotionScores};
use crate::models::{Message, Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionEntry {
    pub timestamp: DateTime<Utc>,
    /// Only emotions with a non-zero intensity.
    pub emotions: BTreeMap<Emotion, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EmotionEntry {
    pub fn new(emotions: &EmotionScores, note: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            emotions: emotions
                .iter()
                .filter(|(_, v)| **v > 0.0)
                .map(|(e, v)| (*e, v.clamp(0.0, 1.0)))
                .collect(),
            note,
        }
    }

    /// Strongest emotion in the entry, if any.
    pub fn dominant(&self) -> Option<Emotion> {
        self.emotions
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(e, _)| *e)
    }
}

/// Builds a history from the conversation log's analyzed user messages.
pub fn extract_emotion_history(messages: &[Message]) -> Vec<EmotionEntry> {
    messages
        .iter()
        .filter(|m| m.role == Role::User)
        .filter_map(|m| {
            let analysis = m.analysis.as_ref()?;
            let mut entry = EmotionEntry::new(&analysis.emotions, None);
            entry.timestamp = m.timestamp;
            Some(entry)
        })
        .filter(|e| !e.emotions.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MoodSummary {
    pub entries: usize,
    /// Mean intensity per emotion across entries where it appears.
    pub averages: BTreeMap<Emotion, f64>,
    /// Emotion most often strongest in an entry.
    pub most_frequent: Option<Emotion>,
}

pub fn summarize(history: &[EmotionEntry]) -> MoodSummary {
    let mut sums: BTreeMap<Emotion, (f64, usize)> = BTreeMap::new();
    let mut dominant_counts: BTreeMap<Emotion, usize> = BTreeMap::new();

    for entry in history {
        for (emotion, value) in &entry.emotions {
            let slot = sums.entry(*emotion).or_insert((0.0, 0));
            slot.0 += value;
            slot.1 += 1;
        }
        if let Some(d) = entry.dominant() {
            *dominant_counts.entry(d).or_insert(0) += 1;
        }
    }

    let most_frequent = dominant_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(e, _)| *e);

    MoodSummary {
        entries: history.len(),
        averages: sums
            .into_iter()
            .map(|(e, (sum, n))| (e, sum / n as f64))
            .collect(),
        most_frequent,
    }
}
