//! Ordered, validated intent ruleset.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use thiserror::Error;
use tracing::error;

use super::engine::ChatResult;
use super::normalize::normalize_message;
use super::pattern::{IntentPattern, PatternError, PatternSpec, TextMatcher};
use crate::config::ChatbotConfig;
use crate::errors::EngineError;

pub const DEFAULT_FALLBACK: &str = "Sorry, I didn't catch that. You can ask about products, \
     orders, shipping, payments or returns.";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One rule as declared in a ruleset file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: String,
    #[serde(default)]
    pub priority: i32,
    pub pattern: PatternSpec,
    /// Tera template; `message`, `normalized` and `captures.<group>` are in scope.
    pub response: String,
}

impl RuleSpec {
    pub fn new(
        id: impl Into<String>,
        priority: i32,
        pattern: PatternSpec,
        response: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), priority, pattern, response: response.into() }
    }
}

#[derive(Clone, Debug)]
pub struct IntentRule {
    pub id: RuleId,
    pub priority: i32,
    pub spec: PatternSpec,
    pub pattern: IntentPattern,
    pub response: String,
}

#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("rule id must not be empty")]
    EmptyRuleId,
    #[error("duplicate rule id `{0}`")]
    DuplicateRuleId(String),
    #[error("rule `{rule_id}` repeats the pattern and priority {priority} of an earlier rule")]
    DuplicatePattern { rule_id: String, priority: i32 },
    #[error("rule `{0}` has an empty response")]
    EmptyResponse(String),
    #[error("fallback response must not be empty")]
    EmptyFallback,
    #[error("rule `{rule_id}` has an invalid pattern: {source}")]
    Pattern { rule_id: String, source: PatternError },
    #[error("rule `{rule_id}` has an invalid response template: {source}")]
    Template { rule_id: String, source: tera::Error },
    #[error("could not read ruleset file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse ruleset: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Immutable ruleset, sorted by descending priority with declaration order
/// kept among equal priorities.
#[derive(Clone, Debug)]
pub struct Ruleset {
    rules: Vec<IntentRule>,
    fallback: String,
    templates: Tera,
}

#[derive(Debug, Deserialize)]
struct RulesetFile {
    fallback: Option<String>,
    #[serde(default)]
    rules: Vec<RuleSpec>,
}

impl Ruleset {
    pub fn new(specs: Vec<RuleSpec>, fallback: impl Into<String>) -> Result<Self, RulesetError> {
        let fallback = fallback.into();
        if fallback.trim().is_empty() {
            return Err(RulesetError::EmptyFallback);
        }

        let mut templates = Tera::default();
        templates.autoescape_on(Vec::new());

        let mut ids = HashSet::with_capacity(specs.len());
        let mut signatures = HashSet::with_capacity(specs.len());
        let mut rules = Vec::with_capacity(specs.len());

        for spec in specs {
            let id = spec.id.trim().to_owned();
            if id.is_empty() {
                return Err(RulesetError::EmptyRuleId);
            }
            if !ids.insert(id.clone()) {
                return Err(RulesetError::DuplicateRuleId(id));
            }
            if spec.response.trim().is_empty() {
                return Err(RulesetError::EmptyResponse(id));
            }
            if !signatures.insert((spec.pattern.canonical(), spec.priority)) {
                return Err(RulesetError::DuplicatePattern { rule_id: id, priority: spec.priority });
            }

            let pattern = IntentPattern::compile(&spec.pattern)
                .map_err(|source| RulesetError::Pattern { rule_id: id.clone(), source })?;
            templates
                .add_raw_template(&id, &spec.response)
                .map_err(|source| RulesetError::Template { rule_id: id.clone(), source })?;

            rules.push(IntentRule {
                id: RuleId(id),
                priority: spec.priority,
                spec: spec.pattern,
                pattern,
                response: spec.response,
            });
        }

        // Catch templates that reference variables no match can provide.
        for rule in &rules {
            let probe = template_context("", "", &rule.pattern.captures(""));
            templates.render(rule.id.as_str(), &probe).map_err(|source| {
                RulesetError::Template { rule_id: rule.id.0.clone(), source }
            })?;
        }

        rules.sort_by(|left, right| right.priority.cmp(&left.priority));

        Ok(Self { rules, fallback, templates })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, RulesetError> {
        let file = toml::from_str::<RulesetFile>(raw)?;
        Self::new(file.rules, file.fallback.unwrap_or_else(|| DEFAULT_FALLBACK.to_owned()))
    }

    pub fn load_file(path: &Path) -> Result<Self, RulesetError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| RulesetError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    /// Built-in storefront rules, answering in English to English and Spanish
    /// keywords alike.
    pub fn builtin() -> Result<Self, RulesetError> {
        Self::new(builtin_rule_specs(), DEFAULT_FALLBACK)
    }

    /// Ruleset named by the chatbot config (file or built-in), with the
    /// configured fallback applied.
    pub fn from_config(config: &ChatbotConfig) -> Result<Self, RulesetError> {
        let ruleset = match &config.ruleset_path {
            Some(path) => Self::load_file(path)?,
            None => Self::builtin()?,
        };
        match &config.fallback_response {
            Some(fallback) => ruleset.with_fallback(fallback.clone()),
            None => Ok(ruleset),
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Result<Self, RulesetError> {
        let fallback = fallback.into();
        if fallback.trim().is_empty() {
            return Err(RulesetError::EmptyFallback);
        }
        self.fallback = fallback;
        Ok(self)
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Highest-priority rule matching already-normalized text.
    pub fn first_match(&self, normalized: &str) -> Option<&IntentRule> {
        self.rules.iter().find(|rule| rule.pattern.matches(normalized))
    }

    pub fn respond(&self, message: &str) -> Result<ChatResult, EngineError> {
        let normalized = normalize_message(message);
        if normalized.is_empty() {
            return Err(EngineError::invalid_argument("message must not be empty"));
        }
        Ok(self.evaluate(message.trim(), &normalized))
    }

    pub fn evaluate(&self, message: &str, normalized: &str) -> ChatResult {
        match self.first_match(normalized) {
            Some(rule) => {
                ChatResult::matched(rule.id.clone(), self.render(rule, message, normalized))
            }
            None => ChatResult::fallback(self.fallback.clone()),
        }
    }

    fn render(&self, rule: &IntentRule, message: &str, normalized: &str) -> String {
        let context = template_context(message, normalized, &rule.pattern.captures(normalized));
        match self.templates.render(rule.id.as_str(), &context) {
            Ok(rendered) => rendered,
            Err(render_error) => {
                error!(
                    event_name = "chatbot.template.render_failed",
                    rule_id = %rule.id,
                    error = %render_error,
                    "response template failed to render; returning raw template"
                );
                rule.response.clone()
            }
        }
    }
}

fn template_context(
    message: &str,
    normalized: &str,
    captures: &BTreeMap<String, String>,
) -> Context {
    let mut context = Context::new();
    context.insert("message", message);
    context.insert("normalized", normalized);
    context.insert("captures", captures);
    context
}

#[derive(Debug, Clone, Copy)]
enum SeedPattern {
    Keywords(&'static [&'static str]),
    Regex(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct RuleSeed {
    id: &'static str,
    priority: i32,
    pattern: SeedPattern,
    response: &'static str,
}

const RULE_SEEDS: &[RuleSeed] = &[
    RuleSeed {
        id: "order_status",
        priority: 40,
        pattern: SeedPattern::Regex(
            r"\b(?:order|pedido)\s*#?\s*(?P<order_id>[a-z0-9-]*\d[a-z0-9-]*)",
        ),
        response: "Order {{ captures.order_id | upper }} is being processed. \
                   Tracking details are emailed as soon as it ships.",
    },
    RuleSeed {
        id: "returns",
        priority: 30,
        pattern: SeedPattern::Keywords(&[
            "return", "returns", "refund", "devolución", "devolver", "reembolso",
        ]),
        response: "Unused items can be returned within 30 days with the receipt. \
                   Refunds go back to the original payment method.",
    },
    RuleSeed {
        id: "hours",
        priority: 20,
        pattern: SeedPattern::Keywords(&[
            "hours", "open", "opening", "horario", "abren", "abierto",
        ]),
        response: "The campus store is open Monday to Friday 8:00-18:00 and Saturday 9:00-13:00.",
    },
    RuleSeed {
        id: "shipping",
        priority: 20,
        pattern: SeedPattern::Keywords(&[
            "shipping", "delivery", "ship", "envío", "envíos", "entrega", "domicilio",
        ]),
        response: "Orders ship within 2 business days. Campus pickup is free.",
    },
    RuleSeed {
        id: "payment",
        priority: 20,
        pattern: SeedPattern::Keywords(&[
            "payment", "pay", "card", "pago", "pagar", "tarjeta", "pse", "nequi",
        ]),
        response: "We accept credit and debit cards, PSE transfers and Nequi.",
    },
    RuleSeed {
        id: "recommendations",
        priority: 15,
        pattern: SeedPattern::Keywords(&[
            "recommend", "recommendation", "suggest", "recomienda", "recomendación", "recomendar",
            "sugerencia",
        ]),
        response: "Tell me your program or subject, for example \"books for medicine\", \
                   and I'll point you to the most popular products for it.",
    },
    RuleSeed {
        id: "greeting",
        priority: 10,
        pattern: SeedPattern::Keywords(&[
            "hello", "hi", "hey", "hola", "buenos días", "buenas tardes", "good morning",
        ]),
        response: "Hello! I can recommend products or answer questions about orders, \
                   shipping and payments.",
    },
    RuleSeed {
        id: "thanks",
        priority: 5,
        pattern: SeedPattern::Keywords(&["thanks", "thank you", "gracias"]),
        response: "You're welcome! Anything else I can help with?",
    },
];

fn builtin_rule_specs() -> Vec<RuleSpec> {
    RULE_SEEDS
        .iter()
        .map(|seed| {
            let pattern = match seed.pattern {
                SeedPattern::Keywords(keywords) => {
                    PatternSpec::any_keyword(keywords.iter().copied())
                }
                SeedPattern::Regex(expression) => PatternSpec::regex(expression),
            };
            RuleSpec::new(seed.id, seed.priority, pattern, seed.response)
        })
        .collect()
}
