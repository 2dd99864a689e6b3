//! Static self-help resources surfaced every few turns.

use serde::Serialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::geo::{hotlines_for, CrisisContact};
use crate::random::RandomSource;
use crate::session::{EmotionCategory, SessionState};

/// No resource before this turn.
pub const WARM_UP_TURNS: u64 = 3;
/// Resources surface on turns divisible by this.
pub const RESOURCE_INTERVAL: u64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    CrisisContact,
    Breathing,
    Mindfulness,
    CopingStrategy,
    Quote,
    Resource,
}

/// Order of the weight arrays below.
const WEIGHTED_KINDS: [ResourceKind; 5] = [
    ResourceKind::Breathing,
    ResourceKind::Mindfulness,
    ResourceKind::CopingStrategy,
    ResourceKind::Quote,
    ResourceKind::Resource,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub kind: ResourceKind,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<CrisisContact>,
}

struct Card {
    title: &'static str,
    body: &'static str,
}

const BREATHING: &[Card] = &[
    Card {
        title: "Box breathing",
        body: "Breathe in for 4 counts, hold for 4, breathe out for 4, hold for 4. Repeat four times.",
    },
    Card {
        title: "4-7-8 breathing",
        body: "Inhale through your nose for 4 counts, hold for 7, and exhale slowly through your mouth for 8.",
    },
    Card {
        title: "Belly breathing",
        body: "Place a hand on your belly. Breathe in slowly so your hand rises, then let it fall as you breathe out.",
    },
];

const MINDFULNESS: &[Card] = &[
    Card {
        title: "5-4-3-2-1 grounding",
        body: "Name 5 things you can see, 4 you can touch, 3 you can hear, 2 you can smell and 1 you can taste.",
    },
    Card {
        title: "Body scan",
        body: "Move your attention slowly from your toes to the top of your head, noticing each sensation without judging it.",
    },
    Card {
        title: "One mindful minute",
        body: "For the next minute, simply notice your breath. When your mind wanders, gently bring it back.",
    },
];

const COPING: &[Card] = &[
    Card {
        title: "Name it to tame it",
        body: "Write down the feeling you are having in one word. Labeling an emotion can make it easier to hold.",
    },
    Card {
        title: "Small next step",
        body: "Pick one small, doable thing for the next hour: a glass of water, a short walk, a message to a friend.",
    },
    Card {
        title: "Thought check",
        body: "Ask yourself: what is the evidence for this thought, and what would I tell a friend who had it?",
    },
    Card {
        title: "Worry window",
        body: "Set aside fifteen minutes later today for worries. When one comes up now, note it and save it for then.",
    },
];

const QUOTES: &[Card] = &[
    Card {
        title: "Thich Nhat Hanh",
        body: "Feelings come and go like clouds in a windy sky. Conscious breathing is my anchor.",
    },
    Card {
        title: "Maya Angelou",
        body: "You may not control all the events that happen to you, but you can decide not to be reduced by them.",
    },
    Card {
        title: "Mary Anne Radmacher",
        body: "Courage doesn't always roar. Sometimes courage is the quiet voice at the end of the day saying, I will try again tomorrow.",
    },
    Card {
        title: "Rumi",
        body: "The wound is the place where the Light enters you.",
    },
];

const GENERAL: &[Card] = &[
    Card {
        title: "Talking to someone",
        body: "A counselor, doctor or trusted person can help you carry what you are going through. Reaching out is a strength.",
    },
    Card {
        title: "Sleep basics",
        body: "Keep a regular wake-up time, limit screens before bed and keep your bedroom cool and dark.",
    },
    Card {
        title: "Moving your body",
        body: "Even ten minutes of gentle movement can lift your mood. Try a short walk outside if you can.",
    },
];

fn cards(kind: ResourceKind) -> &'static [Card] {
    match kind {
        ResourceKind::Breathing => BREATHING,
        ResourceKind::Mindfulness => MINDFULNESS,
        ResourceKind::CopingStrategy => COPING,
        ResourceKind::Quote => QUOTES,
        ResourceKind::Resource | ResourceKind::CrisisContact => GENERAL,
    }
}

/// Weights for [`WEIGHTED_KINDS`] given the dominant emotion.
fn weights(dominant: EmotionCategory) -> [u32; 5] {
    match dominant {
        EmotionCategory::Anxiety => [4, 3, 2, 1, 1],
        EmotionCategory::Depression => [1, 1, 3, 3, 2],
        EmotionCategory::Anger => [3, 2, 3, 1, 1],
        EmotionCategory::Grief => [1, 1, 2, 3, 3],
        EmotionCategory::Joy => [1, 2, 1, 4, 1],
        EmotionCategory::Confusion | EmotionCategory::Neutral => [1, 1, 1, 1, 1],
    }
}

/// Whether a resource may surface on this turn.
pub fn is_resource_turn(turn_count: u64) -> bool {
    turn_count >= WARM_UP_TURNS && turn_count % RESOURCE_INTERVAL == 0
}

pub struct ResourceSelector {
    contacts: &'static [CrisisContact],
    rng: Box<dyn RandomSource>,
}

impl ResourceSelector {
    pub fn new(contacts: &'static [CrisisContact], rng: Box<dyn RandomSource>) -> Self {
        Self { contacts, rng }
    }

    /// Uses the configured default country's hotlines.
    pub fn from_config(config: &AppConfig, rng: Box<dyn RandomSource>) -> Self {
        Self::new(hotlines_for(&config.default_country, "US"), rng)
    }

    pub fn maybe_select_resource(
        &mut self,
        state: &SessionState,
        turn_count: u64,
    ) -> Option<Resource> {
        if !is_resource_turn(turn_count) {
            return None;
        }

        if state.crisis_detected() {
            return Some(self.crisis_resource());
        }

        let dominant = state.dominant_emotion();
        let kind = self
            .rng
            .pick_weighted(&weights(dominant))
            .map(|i| WEIGHTED_KINDS[i])
            .unwrap_or(ResourceKind::Resource);
        let pool = cards(kind);
        let card = &pool[self.rng.index(pool.len())];
        debug!(?kind, %dominant, turn_count, "Selected resource");

        Some(Resource {
            kind,
            title: card.title.to_string(),
            body: card.body.to_string(),
            contacts: vec![],
        })
    }

    fn crisis_resource(&self) -> Resource {
        Resource {
            kind: ResourceKind::CrisisContact,
            title: "You don't have to go through this alone".to_string(),
            body: "If you are in danger or thinking about ending your life, please reach out now. \
                   These lines are free, confidential and open around the clock."
                .to_string(),
            contacts: self.contacts.to_vec(),
        }
    }
}
