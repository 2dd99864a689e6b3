//! Therapy-style approach tags for the conversation.
//!
//! Advisory only: the tags describe the tone the reply is nominally biased
//! toward and are never enforced on the remote model.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::emotions::EmotionCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TherapyApproach {
    Cbt,
    Mindfulness,
    BehavioralActivation,
    CompassionFocused,
    SolutionFocused,
    PersonCentered,
}

impl TherapyApproach {
    pub fn label(&self) -> &'static str {
        match self {
            TherapyApproach::Cbt => "cbt",
            TherapyApproach::Mindfulness => "mindfulness",
            TherapyApproach::BehavioralActivation => "behavioral_activation",
            TherapyApproach::CompassionFocused => "compassion_focused",
            TherapyApproach::SolutionFocused => "solution_focused",
            TherapyApproach::PersonCentered => "person_centered",
        }
    }
}

impl fmt::Display for TherapyApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Picks one or two tags by priority: anxiety, depression, grief, confusion, default.
pub fn select_approach(categories: &[EmotionCategory]) -> Vec<TherapyApproach> {
    let has = |c: EmotionCategory| categories.contains(&c);
    if has(EmotionCategory::Anxiety) {
        vec![TherapyApproach::Cbt, TherapyApproach::Mindfulness]
    } else if has(EmotionCategory::Depression) {
        vec![TherapyApproach::BehavioralActivation, TherapyApproach::Cbt]
    } else if has(EmotionCategory::Grief) {
        vec![TherapyApproach::CompassionFocused, TherapyApproach::PersonCentered]
    } else if has(EmotionCategory::Confusion) {
        vec![TherapyApproach::SolutionFocused]
    } else {
        vec![TherapyApproach::PersonCentered]
    }
}
