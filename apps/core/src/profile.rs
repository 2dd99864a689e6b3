//! Long-lived user profile and the rules that fold each analysis into it.
//!
//! Every update is a convex blend of two values already in `[0, 1]`, so every
//! scalar on the profile stays in `[0, 1]`. Updates never touch the caller's
//! copy: [`ProfileUpdater::update`] borrows the old profile and returns a new one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::brain::{Emotion, TextAnalysis};

/// Smoothing weight given to the new target on every blend.
pub const SMOOTHING: f64 = 0.3;
/// Neutral starting value for every trait and style axis.
pub const NEUTRAL: f64 = 0.5;

const INTEREST_SEED: f64 = 0.6;
const INTEREST_TARGET: f64 = 0.8;
const CONCERN_THRESHOLD: f64 = 0.5;
const POSITIVE_SENTIMENT_THRESHOLD: f64 = 0.5;
const SOCIAL_TRAIT_TARGET: f64 = 0.6;
const OPENNESS_COMPLEXITY_THRESHOLD: f64 = 0.6;
const OPENNESS_TARGET: f64 = 0.7;

/// `current * (1 - weight) + target * weight`, kept inside `[0, 1]`.
pub fn weighted_average(current: f64, target: f64, weight: f64) -> f64 {
    (current * (1.0 - weight) + target * weight).clamp(0.0, 1.0)
}

/// Big-Five-like personality estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

impl Default for PersonalityTraits {
    fn default() -> Self {
        Self {
            openness: NEUTRAL,
            conscientiousness: NEUTRAL,
            extraversion: NEUTRAL,
            agreeableness: NEUTRAL,
            neuroticism: NEUTRAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationStyle {
    pub verbosity: f64,
    pub formality: f64,
    pub emotionality: f64,
    pub directness: f64,
    pub analytical: f64,
}

impl Default for CommunicationStyle {
    fn default() -> Self {
        Self {
            verbosity: NEUTRAL,
            formality: NEUTRAL,
            emotionality: NEUTRAL,
            directness: NEUTRAL,
            analytical: NEUTRAL,
        }
    }
}

/// Append-only record of what the user has talked about.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LearningHistory {
    pub topics: Vec<String>,
    pub insights: Vec<String>,
    pub techniques: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub personality_traits: PersonalityTraits,
    pub communication_style: CommunicationStyle,
    /// topic -> interest level
    pub interests: BTreeMap<String, f64>,
    /// negative emotion -> concern level
    pub concerns: BTreeMap<Emotion, f64>,
    pub learning_history: LearningHistory,
}

impl UserProfile {
    /// Resets to neutral defaults (the user's "clear profile" action).
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Every numeric field, for invariant checks.
    pub fn scalars(&self) -> Vec<f64> {
        let t = &self.personality_traits;
        let s = &self.communication_style;
        let mut values = vec![
            t.openness,
            t.conscientiousness,
            t.extraversion,
            t.agreeableness,
            t.neuroticism,
            s.verbosity,
            s.formality,
            s.emotionality,
            s.directness,
            s.analytical,
        ];
        values.extend(self.interests.values());
        values.extend(self.concerns.values());
        values
    }
}

/// Folds per-turn analysis into the profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileUpdater;

impl ProfileUpdater {
    pub fn new() -> Self {
        Self
    }

    /// Returns the updated profile; `profile` is left untouched.
    pub fn update(&self, profile: &UserProfile, analysis: &TextAnalysis, _raw_text: &str) -> UserProfile {
        let mut next = profile.clone();
        update_communication_style(&mut next.communication_style, analysis);
        update_interests(&mut next, analysis);
        update_concerns(&mut next.concerns, analysis);
        update_traits(&mut next.personality_traits, analysis);
        next
    }
}

fn verbosity_target(token_count: usize) -> f64 {
    match token_count {
        0..=9 => 0.2,
        10..=49 => 0.5,
        _ => 0.8,
    }
}

fn emotionality_target(magnitude: f64) -> f64 {
    if magnitude < 0.1 {
        0.2
    } else if magnitude < 0.3 {
        0.5
    } else {
        0.8
    }
}

/// Bucketed on the unclamped complexity, so out-of-range values land in the end buckets.
fn analytical_target(raw_complexity: f64) -> f64 {
    if raw_complexity < 0.3 {
        0.2
    } else if raw_complexity < 0.6 {
        0.5
    } else {
        0.8
    }
}

fn update_communication_style(style: &mut CommunicationStyle, analysis: &TextAnalysis) {
    style.verbosity = weighted_average(
        style.verbosity,
        verbosity_target(analysis.token_count),
        SMOOTHING,
    );
    style.emotionality = weighted_average(
        style.emotionality,
        emotionality_target(analysis.sentiment.magnitude),
        SMOOTHING,
    );
    style.analytical = weighted_average(
        style.analytical,
        analytical_target(analysis.complexity.raw_score),
        SMOOTHING,
    );
}

fn update_interests(profile: &mut UserProfile, analysis: &TextAnalysis) {
    for topic in &analysis.topics {
        match profile.interests.get_mut(topic) {
            Some(level) => *level = weighted_average(*level, INTEREST_TARGET, SMOOTHING),
            None => {
                profile.interests.insert(topic.clone(), INTEREST_SEED);
            }
        }
        if !profile.learning_history.topics.contains(topic) {
            profile.learning_history.topics.push(topic.clone());
        }
    }
}

fn update_concerns(concerns: &mut BTreeMap<Emotion, f64>, analysis: &TextAnalysis) {
    for (emotion, intensity) in &analysis.emotions {
        if !emotion.is_negative() || *intensity <= CONCERN_THRESHOLD {
            continue;
        }
        let intensity = intensity.clamp(0.0, 1.0);
        concerns
            .entry(*emotion)
            .and_modify(|level| *level = weighted_average(*level, intensity, SMOOTHING))
            .or_insert(intensity);
    }
}

fn update_traits(traits: &mut PersonalityTraits, analysis: &TextAnalysis) {
    if analysis.sentiment.score > POSITIVE_SENTIMENT_THRESHOLD {
        traits.extraversion = weighted_average(traits.extraversion, SOCIAL_TRAIT_TARGET, SMOOTHING);
        traits.agreeableness = weighted_average(traits.agreeableness, SOCIAL_TRAIT_TARGET, SMOOTHING);
    }
    if analysis.complexity.score > OPENNESS_COMPLEXITY_THRESHOLD {
        traits.openness = weighted_average(traits.openness, OPENNESS_TARGET, SMOOTHING);
    }
}
