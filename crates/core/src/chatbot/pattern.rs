use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::normalize::normalize_message;
use crate::text::contains_term;

/// Uniform matching contract over normalized message text.
pub trait TextMatcher {
    fn matches(&self, normalized: &str) -> bool;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMode {
    /// At least one keyword must occur.
    #[default]
    Any,
    /// Every keyword must occur.
    All,
}

/// Declarative pattern as written in a ruleset file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternSpec {
    Substring {
        value: String,
    },
    Keywords {
        keywords: Vec<String>,
        #[serde(default)]
        mode: KeywordMode,
    },
    Regex {
        expression: String,
    },
}

impl PatternSpec {
    pub fn substring(value: impl Into<String>) -> Self {
        Self::Substring { value: value.into() }
    }

    pub fn any_keyword<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keywords {
            keywords: keywords.into_iter().map(Into::into).collect(),
            mode: KeywordMode::Any,
        }
    }

    pub fn regex(expression: impl Into<String>) -> Self {
        Self::Regex { expression: expression.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Substring { .. } => "substring",
            Self::Keywords { .. } => "keywords",
            Self::Regex { .. } => "regex",
        }
    }

    /// Normalized form used to detect duplicate rules: text is normalized the
    /// same way messages are and keyword sets are sorted and deduplicated.
    pub fn canonical(&self) -> Self {
        match self {
            Self::Substring { value } => Self::Substring { value: normalize_message(value) },
            Self::Keywords { keywords, mode } => {
                let mut keywords = keywords
                    .iter()
                    .map(|keyword| normalize_message(keyword))
                    .filter(|keyword| !keyword.is_empty())
                    .collect::<Vec<_>>();
                keywords.sort();
                keywords.dedup();
                Self::Keywords { keywords, mode: *mode }
            }
            Self::Regex { expression } => Self::Regex { expression: expression.clone() },
        }
    }
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("substring pattern must not be empty")]
    EmptySubstring,
    #[error("keyword pattern needs at least one non-blank keyword")]
    EmptyKeywords,
    #[error("invalid regular expression `{expression}`: {source}")]
    InvalidRegex { expression: String, source: regex::Error },
}

#[derive(Clone, Debug)]
pub struct SubstringPattern {
    needle: String,
}

impl SubstringPattern {
    pub fn new(value: &str) -> Result<Self, PatternError> {
        let needle = normalize_message(value);
        if needle.is_empty() {
            return Err(PatternError::EmptySubstring);
        }
        Ok(Self { needle })
    }
}

impl TextMatcher for SubstringPattern {
    fn matches(&self, normalized: &str) -> bool {
        normalized.contains(&self.needle)
    }
}

/// Keywords match as whole words or phrases, so `hi` does not fire on `this`.
#[derive(Clone, Debug)]
pub struct KeywordPattern {
    keywords: Vec<String>,
    mode: KeywordMode,
}

impl KeywordPattern {
    pub fn new(keywords: &[String], mode: KeywordMode) -> Result<Self, PatternError> {
        let keywords = keywords
            .iter()
            .map(|keyword| normalize_message(keyword))
            .filter(|keyword| !keyword.is_empty())
            .collect::<Vec<_>>();
        if keywords.is_empty() {
            return Err(PatternError::EmptyKeywords);
        }
        Ok(Self { keywords, mode })
    }
}

impl TextMatcher for KeywordPattern {
    fn matches(&self, normalized: &str) -> bool {
        let mut keywords = self.keywords.iter();
        match self.mode {
            KeywordMode::Any => keywords.any(|keyword| contains_term(normalized, keyword)),
            KeywordMode::All => keywords.all(|keyword| contains_term(normalized, keyword)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RegexPattern {
    regex: Regex,
}

impl RegexPattern {
    pub fn new(expression: &str) -> Result<Self, PatternError> {
        let regex = RegexBuilder::new(expression)
            .case_insensitive(true)
            .build()
            .map_err(|source| PatternError::InvalidRegex {
                expression: expression.to_owned(),
                source,
            })?;
        Ok(Self { regex })
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.regex.capture_names().flatten()
    }

    /// Named groups that participated in the first match.
    pub fn captures(&self, normalized: &str) -> BTreeMap<String, String> {
        let Some(captures) = self.regex.captures(normalized) else {
            return BTreeMap::new();
        };
        self.group_names()
            .filter_map(|name| {
                captures.name(name).map(|value| (name.to_owned(), value.as_str().to_owned()))
            })
            .collect()
    }
}

impl TextMatcher for RegexPattern {
    fn matches(&self, normalized: &str) -> bool {
        self.regex.is_match(normalized)
    }
}

/// Compiled pattern of any kind.
#[derive(Clone, Debug)]
pub enum IntentPattern {
    Substring(SubstringPattern),
    Keywords(KeywordPattern),
    Regex(RegexPattern),
}

impl IntentPattern {
    pub fn compile(spec: &PatternSpec) -> Result<Self, PatternError> {
        Ok(match spec {
            PatternSpec::Substring { value } => Self::Substring(SubstringPattern::new(value)?),
            PatternSpec::Keywords { keywords, mode } => {
                Self::Keywords(KeywordPattern::new(keywords, *mode)?)
            }
            PatternSpec::Regex { expression } => Self::Regex(RegexPattern::new(expression)?),
        })
    }

    /// Names of every capture group the pattern can produce.
    pub fn capture_names(&self) -> Vec<String> {
        match self {
            Self::Regex(pattern) => pattern.group_names().map(str::to_owned).collect(),
            Self::Substring(_) | Self::Keywords(_) => Vec::new(),
        }
    }

    /// Capture values for template rendering. Every declared group is present;
    /// groups that did not participate are empty strings.
    pub fn captures(&self, normalized: &str) -> BTreeMap<String, String> {
        let mut values = self
            .capture_names()
            .into_iter()
            .map(|name| (name, String::new()))
            .collect::<BTreeMap<_, _>>();
        if let Self::Regex(pattern) = self {
            values.extend(pattern.captures(normalized));
        }
        values
    }
}

impl TextMatcher for IntentPattern {
    fn matches(&self, normalized: &str) -> bool {
        match self {
            Self::Substring(pattern) => pattern.matches(normalized),
            Self::Keywords(pattern) => pattern.matches(normalized),
            Self::Regex(pattern) => pattern.matches(normalized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IntentPattern, KeywordMode, PatternError, PatternSpec, TextMatcher};

    fn compile(spec: PatternSpec) -> IntentPattern {
        IntentPattern::compile(&spec).expect("pattern compiles")
    }

    #[test]
    fn substring_matches_anywhere_after_normalization() {
        let pattern = compile(PatternSpec::substring("  Hours "));
        assert!(pattern.matches("what are your hours?"));
        assert!(pattern.matches("opening-hours"));
        assert!(!pattern.matches("what time do you open"));
    }

    #[test]
    fn keywords_respect_word_boundaries() {
        let pattern = compile(PatternSpec::any_keyword(["hi", "hello"]));
        assert!(pattern.matches("hi there"));
        assert!(pattern.matches("well, hello!"));
        assert!(!pattern.matches("this is a test"));
    }

    #[test]
    fn keyword_phrases_and_all_mode() {
        let all = compile(PatternSpec::Keywords {
            keywords: vec!["return".to_owned(), "order".to_owned()],
            mode: KeywordMode::All,
        });
        assert!(all.matches("how do i return my order"));
        assert!(!all.matches("how do i return this"));

        let phrase = compile(PatternSpec::any_keyword(["buenos días"]));
        assert!(phrase.matches("hola, buenos días"));
        assert!(!phrase.matches("buenos"));
    }

    #[test]
    fn regex_is_case_insensitive_and_exposes_named_groups() {
        let pattern = compile(PatternSpec::regex(r"order\s+#?(?P<order_id>[A-Z0-9-]+)"));
        assert!(pattern.matches("where is order #ab-12"));

        let captures = pattern.captures("where is order #ab-12");
        assert_eq!(captures.get("order_id").map(String::as_str), Some("ab-12"));
    }

    #[test]
    fn unmatched_optional_groups_are_present_but_empty() {
        let pattern = compile(PatternSpec::regex(r"track(?:ing)?(?: (?P<code>\d+))?"));
        let captures = pattern.captures("tracking please");
        assert_eq!(captures.get("code").map(String::as_str), Some(""));
    }

    #[test]
    fn non_regex_patterns_have_no_captures() {
        let pattern = compile(PatternSpec::substring("hours"));
        assert!(pattern.capture_names().is_empty());
        assert!(pattern.captures("hours").is_empty());
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        assert!(matches!(
            IntentPattern::compile(&PatternSpec::substring("   ")),
            Err(PatternError::EmptySubstring)
        ));
        assert!(matches!(
            IntentPattern::compile(&PatternSpec::any_keyword(["", " "])),
            Err(PatternError::EmptyKeywords)
        ));
        assert!(matches!(
            IntentPattern::compile(&PatternSpec::regex("(unclosed")),
            Err(PatternError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn canonical_form_ignores_keyword_order_and_case() {
        let left = PatternSpec::any_keyword(["Hello", "hi", "hi"]).canonical();
        let right = PatternSpec::any_keyword(["hi", "hello"]).canonical();
        assert_eq!(left, right);
        assert_ne!(
            PatternSpec::substring("hours").canonical(),
            PatternSpec::any_keyword(["hours"]).canonical()
        );
    }

    #[test]
    fn pattern_specs_deserialize_from_tagged_tables() {
        let spec: PatternSpec =
            toml::from_str("kind = \"keywords\"\nkeywords = [\"a\", \"b\"]\nmode = \"all\"\n")
                .expect("spec parses");
        assert_eq!(
            spec,
            PatternSpec::Keywords {
                keywords: vec!["a".to_owned(), "b".to_owned()],
                mode: KeywordMode::All
            }
        );

        let default_mode: PatternSpec =
            toml::from_str("kind = \"keywords\"\nkeywords = [\"a\"]\n").expect("spec parses");
        assert!(matches!(default_mode, PatternSpec::Keywords { mode: KeywordMode::Any, .. }));
    }
}
