//! Intent-matching chatbot
//!
//! A ruleset maps normalized user messages to templated responses. Rules are
//! tried in descending priority; the first match answers and anything
//! unmatched gets the fallback text.

mod engine;
mod normalize;
mod pattern;
mod ruleset;

pub use engine::{ChatOutcome, ChatResult, ChatbotEngine};
pub use normalize::normalize_message;
pub use pattern::{
    IntentPattern, KeywordMode, KeywordPattern, PatternError, PatternSpec, RegexPattern,
    SubstringPattern, TextMatcher,
};
pub use ruleset::{IntentRule, RuleId, RuleSpec, Ruleset, RulesetError, DEFAULT_FALLBACK};
