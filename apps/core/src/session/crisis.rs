//! Crisis phrase detection.
//!
//! A literal, case-insensitive substring search against a static list. A match
//! switches the session into crisis mode for the turn and the reply becomes
//! the fixed safety message instead of a model response.

/// Phrases that trigger the safety response.
pub const CRISIS_PHRASES: &[&str] = &[
    "kill myself",
    "killing myself",
    "end my life",
    "ending my life",
    "take my life",
    "want to die",
    "wanna die",
    "suicide",
    "suicidal",
    "self harm",
    "self-harm",
    "hurt myself",
    "cut myself",
    "no reason to live",
    "better off dead",
    "end it all",
    "don't want to be alive",
    "dont want to be alive",
    "not worth living",
];

/// Returns the first crisis phrase found in `text`, if any.
pub fn detect_crisis_phrase(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    CRISIS_PHRASES.iter().copied().find(|p| lower.contains(p))
}
