use axum::{
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
};

use crate::config::Settings;
use crate::service::{RollupService, SummaryRequest, WindowRequest};

/// Shared application state
pub struct AppState {
    pub service: RollupService,
}

/// GET /api/v1/health - Liveness check
pub async fn get_health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// POST /api/v1/aggregate/to-json - Hourly profit export
pub async fn post_aggregate_to_json(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WindowRequest>,
) -> impl IntoResponse {
    Json(state.service.hourly(&request).await)
}

/// POST /api/v1/trade-summary/query - Daily position breakdown
pub async fn post_trade_summary(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummaryRequest>,
) -> impl IntoResponse {
    Json(state.service.summary(&request).await)
}

async fn favicon() -> Redirect {
    Redirect::temporary("/static/Favicon-01.svg")
}

pub fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins = settings.cors_origins();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.contains(&"*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

pub fn router(state: Arc<AppState>) -> Router {
    let settings = state.service.settings();
    let cors = cors_layer(settings);
    let public_dir = ServeDir::new(&settings.public_export_dir);

    let api = Router::new()
        .route("/health", get(get_health))
        .route("/aggregate/to-json", post(post_aggregate_to_json))
        .route("/trade-summary/query", post(post_trade_summary));

    Router::new()
        .nest("/api/v1", api)
        .nest_service("/static", public_dir)
        .route("/favicon.ico", get(favicon))
        .layer(cors)
        .with_state(state)
}
