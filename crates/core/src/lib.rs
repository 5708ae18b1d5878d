pub mod catalog;
pub mod chatbot;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod errors;
pub mod recommendations;
pub mod snapshot;
pub mod text;

pub use catalog::{seed_products, CatalogError, CatalogSnapshot};
pub use chatbot::{
    normalize_message, ChatOutcome, ChatResult, ChatbotEngine, IntentPattern, IntentRule,
    PatternSpec, RuleId, RuleSpec, Ruleset, RulesetError,
};
pub use classifier::{
    AcademicCategory, AcademicClassifier, Classification, Guidance, QueryAnalysis,
    StudentScenario,
};
pub use domain::product::{Product, ProductId};
pub use errors::{Component, EngineError, InterfaceError};
pub use recommendations::{RecommendationEngine, RecommendationSource, Recommendations};
pub use snapshot::SnapshotCell;
