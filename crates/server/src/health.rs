use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use unishop_core::chatbot::ChatbotEngine;
use unishop_core::recommendations::RecommendationEngine;

#[derive(Clone)]
pub struct HealthState {
    recommendations: RecommendationEngine,
    chatbot: ChatbotEngine,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub catalog: HealthCheck,
    pub ruleset: HealthCheck,
    pub checked_at: String,
}

pub fn router(recommendations: RecommendationEngine, chatbot: ChatbotEngine) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { recommendations, chatbot })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state.recommendations);
    let ruleset = ruleset_check(&state.chatbot);
    let ready = catalog.status == "ready" && ruleset.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        catalog,
        ruleset,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn catalog_check(engine: &RecommendationEngine) -> HealthCheck {
    match engine.catalog().load() {
        Some(snapshot) => HealthCheck {
            status: "ready",
            detail: format!("{} products loaded", snapshot.len()),
        },
        None => HealthCheck { status: "degraded", detail: "catalog not loaded".to_string() },
    }
}

fn ruleset_check(engine: &ChatbotEngine) -> HealthCheck {
    match engine.ruleset().load() {
        Some(ruleset) if !ruleset.is_empty() => HealthCheck {
            status: "ready",
            detail: format!("{} rules loaded", ruleset.len()),
        },
        Some(_) => HealthCheck { status: "degraded", detail: "ruleset has no rules".to_string() },
        None => HealthCheck { status: "degraded", detail: "ruleset not loaded".to_string() },
    }
}
