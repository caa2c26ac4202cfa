use axum::{
    Router,
    routing::{get, post},
};
use http::{HeaderValue, Method, header::CONTENT_TYPE};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers::{api, generate};
use crate::state::AppState;

/// Create the API router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::service_info))
        .route("/health", get(api::health_check))
        .route("/generate-script", post(generate::generate_script))
        .layer(TraceLayer::new_for_http())
}

/// CORS layer for the configured origins; `None` keeps same-origin only.
pub fn cors_layer(origins: Option<Vec<String>>) -> Option<CorsLayer> {
    let Some(origins) = origins else {
        info!(
            "CORS not configured, defaulting to same-origin only. \
             Set CORS_ALLOWED_ORIGINS to enable cross-origin access."
        );
        return None;
    };

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    if origins.iter().any(|origin| origin == "*") {
        return Some(layer.allow_origin(Any));
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(layer.allow_origin(parsed))
}

/// Full application router with state applied.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origins());
    create_api_router()
        .with_state(state)
        .layer(tower::util::option_layer(cors))
}
