use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::ruleset::{RuleId, Ruleset};
use crate::errors::{Component, EngineError};
use crate::snapshot::SnapshotCell;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatOutcome {
    Matched,
    /// No rule matched. A normal result, not an error.
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatResult {
    pub response: String,
    pub matched_rule: Option<RuleId>,
    pub outcome: ChatOutcome,
}

impl ChatResult {
    pub fn matched(rule: RuleId, response: String) -> Self {
        Self { response, matched_rule: Some(rule), outcome: ChatOutcome::Matched }
    }

    pub fn fallback(response: String) -> Self {
        Self { response, matched_rule: None, outcome: ChatOutcome::Fallback }
    }

    pub fn is_fallback(&self) -> bool {
        self.outcome == ChatOutcome::Fallback
    }
}

/// Stateless responder over the current ruleset snapshot. Each call is an
/// independent (ruleset, message) evaluation with no conversation memory.
#[derive(Clone, Debug)]
pub struct ChatbotEngine {
    ruleset: Arc<SnapshotCell<Ruleset>>,
}

impl Default for ChatbotEngine {
    fn default() -> Self {
        Self::new(Arc::new(SnapshotCell::empty()))
    }
}

impl ChatbotEngine {
    pub fn new(ruleset: Arc<SnapshotCell<Ruleset>>) -> Self {
        Self { ruleset }
    }

    pub fn with_ruleset(ruleset: Ruleset) -> Self {
        Self::new(Arc::new(SnapshotCell::loaded(ruleset)))
    }

    pub fn ruleset(&self) -> &Arc<SnapshotCell<Ruleset>> {
        &self.ruleset
    }

    /// Ready once a ruleset with at least one rule is loaded.
    pub fn is_ready(&self) -> bool {
        self.ruleset.load().is_some_and(|ruleset| !ruleset.is_empty())
    }

    pub fn replace_ruleset(&self, ruleset: Ruleset) -> Option<usize> {
        let incoming = ruleset.len();
        let previous = self.ruleset.store(ruleset).map(|previous| previous.len());
        debug!(
            event_name = "chatbot.ruleset.swapped",
            rules = incoming,
            previous_rules = previous,
            "ruleset snapshot replaced"
        );
        previous
    }

    pub fn respond(&self, message: &str) -> Result<ChatResult, EngineError> {
        if message.trim().is_empty() {
            return Err(EngineError::invalid_argument("message must not be empty"));
        }
        let ruleset = self
            .ruleset
            .load()
            .filter(|ruleset| !ruleset.is_empty())
            .ok_or(EngineError::NotReady(Component::Ruleset))?;

        ruleset.respond(message)
    }
}
