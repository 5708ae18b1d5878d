//! JSON API over the recommendation, chatbot and classifier engines.
//!
//! - `GET  /`                                                 service banner
//! - `GET  /health`                                           snapshot readiness
//! - `GET  /api/v1/recommendations/products/{product_id}/related?limit=`
//! - `GET  /api/v1/recommendations/popular?limit=`
//! - `GET  /api/v1/recommendations/topic?q=&limit=`
//! - `POST /api/v1/chat`                                      `{message}`
//! - `POST /api/v1/classify`                                  `{query}`
//! - `POST /api/v1/admin/reload`                              bearer token

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use unishop_core::chatbot::{ChatResult, ChatbotEngine};
use unishop_core::classifier::{AcademicClassifier, QueryAnalysis};
use unishop_core::config::{AdminConfig, RecommendationsConfig};
use unishop_core::errors::{EngineError, InterfaceError};
use unishop_core::recommendations::{RecommendationEngine, Recommendations};
use unishop_core::ProductId;
use uuid::Uuid;

use crate::bootstrap::{SnapshotSources, SourceError};
use crate::health;

const RELOAD_FAILED_MESSAGE: &str = "reload failed; current snapshots kept";

#[derive(Clone)]
pub struct AppState {
    pub recommendations: RecommendationEngine,
    pub chatbot: ChatbotEngine,
    classifier: AcademicClassifier,
    sources: Arc<SnapshotSources>,
    limits: RecommendationsConfig,
    admin: AdminConfig,
    reload_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        recommendations: RecommendationEngine,
        chatbot: ChatbotEngine,
        sources: Arc<SnapshotSources>,
        limits: RecommendationsConfig,
        admin: AdminConfig,
    ) -> Self {
        Self {
            recommendations,
            chatbot,
            classifier: AcademicClassifier::new(),
            sources,
            limits,
            admin,
            reload_lock: Arc::new(Mutex::new(())),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopicQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct Banner {
    pub message: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub products: usize,
    pub rules: usize,
    pub previous_products: Option<usize>,
    pub previous_rules: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn bad_request(message: impl Into<String>, correlation_id: &str) -> Self {
        InterfaceError::BadRequest {
            message: message.into(),
            correlation_id: correlation_id.to_owned(),
        }
        .into()
    }

    fn engine(error: EngineError, correlation_id: &str) -> Self {
        error.into_interface(correlation_id).into()
    }
}

impl From<InterfaceError> for ApiError {
    fn from(error: InterfaceError) -> Self {
        let status = match &error {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: error.error_code().to_owned(),
            message: error.message().to_owned(),
            correlation_id: error.correlation_id().to_owned(),
        };
        Self { status, body }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                event_name = "api.request.failed",
                correlation_id = %self.body.correlation_id,
                status = self.status.as_u16(),
                error = %self.body.message,
                "request failed"
            );
        } else {
            warn!(
                event_name = "api.request.rejected",
                correlation_id = %self.body.correlation_id,
                status = self.status.as_u16(),
                error = %self.body.message,
                "request rejected"
            );
        }
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState, cors_allow_any_origin: bool) -> Router {
    let api = Router::new()
        .route("/", get(banner))
        .route("/api/v1/recommendations/products/{product_id}/related", get(related))
        .route("/api/v1/recommendations/popular", get(popular))
        .route("/api/v1/recommendations/topic", get(topic))
        .route("/api/v1/chat", post(chat))
        .route("/api/v1/classify", post(classify))
        .route("/api/v1/admin/reload", post(reload))
        .with_state(state.clone())
        .merge(health::router(state.recommendations, state.chatbot))
        .layer(TraceLayer::new_for_http());

    if cors_allow_any_origin {
        api.layer(CorsLayer::permissive())
    } else {
        api
    }
}

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

impl AppState {
    /// Missing limits take the configured default; engines validate the rest.
    fn resolve_limit(&self, limit: Option<i64>, correlation_id: &str) -> Result<i64, ApiError> {
        let limit = limit.unwrap_or(i64::from(self.limits.default_limit));
        let max_limit = i64::from(self.limits.max_limit);
        if limit > max_limit {
            return Err(ApiError::bad_request(
                format!("limit must be at most {max_limit}, got {limit}"),
                correlation_id,
            ));
        }
        Ok(limit)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn banner() -> Json<Banner> {
    Json(Banner { message: "Unishop IA service", status: "running" })
}

pub async fn related(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Recommendations> {
    let correlation_id = correlation_id();
    let Query(query) =
        query.map_err(|rejection| ApiError::bad_request(rejection.body_text(), &correlation_id))?;
    let limit = state.resolve_limit(query.limit, &correlation_id)?;

    let product_id = ProductId::new(product_id);
    let recommendations = state
        .recommendations
        .recommend_by_category(&product_id, limit)
        .map_err(|error| ApiError::engine(error, &correlation_id))?;

    info!(
        event_name = "api.recommendations.related",
        correlation_id = %correlation_id,
        product_id = %product_id,
        returned = recommendations.len(),
        "related recommendations served"
    );
    Ok(Json(recommendations))
}

pub async fn popular(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Recommendations> {
    let correlation_id = correlation_id();
    let Query(query) =
        query.map_err(|rejection| ApiError::bad_request(rejection.body_text(), &correlation_id))?;
    let limit = state.resolve_limit(query.limit, &correlation_id)?;

    let recommendations = state
        .recommendations
        .recommend_popular(limit)
        .map_err(|error| ApiError::engine(error, &correlation_id))?;

    info!(
        event_name = "api.recommendations.popular",
        correlation_id = %correlation_id,
        returned = recommendations.len(),
        "popular recommendations served"
    );
    Ok(Json(recommendations))
}

pub async fn topic(
    State(state): State<AppState>,
    query: Result<Query<TopicQuery>, QueryRejection>,
) -> ApiResult<Recommendations> {
    let correlation_id = correlation_id();
    let Query(query) =
        query.map_err(|rejection| ApiError::bad_request(rejection.body_text(), &correlation_id))?;
    let limit = state.resolve_limit(query.limit, &correlation_id)?;

    let recommendations = state
        .recommendations
        .recommend_for_topic(&query.q, limit)
        .map_err(|error| ApiError::engine(error, &correlation_id))?;

    info!(
        event_name = "api.recommendations.topic",
        correlation_id = %correlation_id,
        returned = recommendations.len(),
        "topic recommendations served"
    );
    Ok(Json(recommendations))
}

pub async fn chat(
    State(state): State<AppState>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResult> {
    let correlation_id = correlation_id();
    let Json(request) =
        request.map_err(|rejection| ApiError::bad_request(rejection.body_text(), &correlation_id))?;

    let result = state
        .chatbot
        .respond(&request.message)
        .map_err(|error| ApiError::engine(error, &correlation_id))?;

    info!(
        event_name = "api.chat.responded",
        correlation_id = %correlation_id,
        rule_id = result.matched_rule.as_ref().map(|rule| rule.as_str()).unwrap_or("fallback"),
        "chat message answered"
    );
    Ok(Json(result))
}

pub async fn classify(
    State(state): State<AppState>,
    request: Result<Json<ClassifyRequest>, JsonRejection>,
) -> ApiResult<QueryAnalysis> {
    let correlation_id = correlation_id();
    let Json(request) =
        request.map_err(|rejection| ApiError::bad_request(rejection.body_text(), &correlation_id))?;
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty", &correlation_id));
    }

    let analysis = state.classifier.analyze(&request.query);
    info!(
        event_name = "api.classify.completed",
        correlation_id = %correlation_id,
        category = analysis.classification.category.map(|category| category.as_str()),
        "query classified"
    );
    Ok(Json(analysis))
}

/// Reloads both snapshots and swaps them in together, or neither when either
/// source fails.
pub async fn reload(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<ReloadResponse> {
    let correlation_id = correlation_id();
    if state.admin.reload_token.is_none() {
        return Err(InterfaceError::NotFound {
            message: "admin reload is not enabled".to_owned(),
            correlation_id,
        }
        .into());
    }

    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or_default();
    if !state.admin.reload_token_matches(presented) {
        return Err(InterfaceError::Unauthorized {
            message: "missing or invalid reload token".to_owned(),
            correlation_id,
        }
        .into());
    }

    let _guard = state.reload_lock.lock().await;
    let internal = |error: SourceError| -> ApiError {
        error!(
            event_name = "api.admin.reload_failed",
            correlation_id = %correlation_id,
            error = %error,
            "snapshot reload failed; current snapshots kept"
        );
        InterfaceError::Internal {
            message: RELOAD_FAILED_MESSAGE.to_owned(),
            correlation_id: correlation_id.clone(),
        }
        .into()
    };
    let catalog = state.sources.load_catalog().await.map_err(internal)?;
    let ruleset = state.sources.load_ruleset().map_err(internal)?;

    let (products, rules) = (catalog.len(), ruleset.len());
    let previous_products = state.recommendations.replace_catalog(catalog);
    let previous_rules = state.chatbot.replace_ruleset(ruleset);

    info!(
        event_name = "api.admin.reloaded",
        correlation_id = %correlation_id,
        products,
        rules,
        "catalog and ruleset reloaded"
    );
    Ok(Json(ReloadResponse { products, rules, previous_products, previous_rules }))
}
