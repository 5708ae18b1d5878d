use unishop_core::chatbot::{ChatbotEngine, Ruleset};

use crate::commands::recommend::engine_failure;
use crate::commands::{load_config, CommandResult};

pub fn run(message: &str) -> CommandResult {
    let config = match load_config("chat") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let ruleset = match Ruleset::from_config(&config.chatbot) {
        Ok(ruleset) => ruleset,
        Err(error) => {
            return CommandResult::failure("chat", "ruleset_load", error.to_string(), 5);
        }
    };

    match ChatbotEngine::with_ruleset(ruleset).respond(message) {
        Ok(result) => {
            let summary = match &result.matched_rule {
                Some(rule) => format!("matched rule `{rule}`"),
                None => "no rule matched; fallback response".to_string(),
            };
            CommandResult::success_with_data("chat", summary, &result)
        }
        Err(error) => engine_failure("chat", &error),
    }
}
