//! Product recommendation engine
//!
//! Serves "related in category" and "most popular" lists from the currently
//! loaded catalog snapshot, plus keyword-driven topic recommendations for
//! academic queries.

mod engine;
mod types;

pub use engine::{popular_products, related_products, topic_products, RecommendationEngine};
pub use types::*;

use crate::errors::EngineError;

/// Result type for recommendation operations
pub type RecommendationResult<T> = Result<T, EngineError>;

/// Limit applied by callers that do not specify one
pub const DEFAULT_LIMIT: usize = 5;

/// Upper bound accepted at the request boundary
pub const DEFAULT_MAX_LIMIT: usize = 100;
