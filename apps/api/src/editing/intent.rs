//! Intent classification — pluggable, trait-based mapping from free text to
//! conversation intent.
//!
//! Default: `RegexIntentClassifier` (case-insensitive whole-message patterns,
//! fast, deterministic, fully testable).
//!
//! `AppState` holds an `Arc<dyn IntentClassifier>`, swapped at startup.

use regex::Regex;

/// Conversation intent of an incoming user message, evaluated against the
/// pending-edit state by the session layer. Anything ambiguous is `Other`
/// and is treated as a fresh editing request, never as a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Affirmative,
    Negative,
    NoChange,
    Other,
}

/// The classifier trait. Implement this to swap the pattern matcher for a
/// model-based classifier without touching the state machine.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Intent;
}

/// Whole-message regex classifier. Patterns are anchored so that a sentence
/// merely containing "yes" somewhere is not read as a confirmation.
pub struct RegexIntentClassifier {
    affirmative: Regex,
    negative: Regex,
    no_change: Regex,
}

impl RegexIntentClassifier {
    pub fn new() -> Self {
        Self {
            affirmative: Regex::new(
                r"(?i)^\s*(yes( please)?|y|yep|yeah|yup|sure|ok(ay)?|confirm(ed)?|go ahead|do it|apply( it| them)?|please do)\s*[.!]*\s*$",
            )
            .expect("affirmative pattern is valid"),
            negative: Regex::new(
                r"(?i)^\s*(no( thanks)?|n|nope|nah|cancel|never ?mind|don'?t|do not|reject|discard( it| that)?|skip( it)?)\s*[.!]*\s*$",
            )
            .expect("negative pattern is valid"),
            no_change: Regex::new(
                r"(?i)^\s*(looks (good|great|fine)( to me)?|nothing( else)?|no changes?|as is|keep it( as is)?|all good|we'?re good|it'?s good|perfect|i'?m done|done)\s*[.!]*\s*$",
            )
            .expect("no-change pattern is valid"),
        }
    }
}

impl Default for RegexIntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier for RegexIntentClassifier {
    fn classify(&self, text: &str) -> Intent {
        if self.affirmative.is_match(text) {
            Intent::Affirmative
        } else if self.negative.is_match(text) {
            Intent::Negative
        } else if self.no_change.is_match(text) {
            Intent::NoChange
        } else {
            Intent::Other
        }
    }
}

/// Expands terse broad requests ("polish", "fix bullets") into an unambiguous
/// instruction before they reach the proposal pipeline. Messages longer than
/// three words are passed through untouched.
pub fn normalize_request(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.split_whitespace().count() > 3 {
        return trimmed.to_string();
    }

    let lower = trimmed.to_lowercase();
    if lower.contains("bullet") {
        return "Rewrite the experience and project bullet points to be concise, \
                action-led, and quantified wherever the existing facts support it."
            .to_string();
    }
    if lower.contains("polish") || lower.contains("professional") {
        return "Polish the wording across the whole resume: tighten phrasing, \
                use strong verbs, and keep every fact unchanged."
            .to_string();
    }
    if lower.contains("skill") {
        return "Reorganize and deduplicate the skills section, grouping related \
                technologies together under clear categories."
            .to_string();
    }

    trimmed.to_string()
}
