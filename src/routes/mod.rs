//! Route modules for the toolbox server

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod pdf;
pub mod tiktok;
pub mod youtube;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the full application router
///
/// Shared by the binary and integration tests so both drive the same app.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload_bytes = state.config().pdf.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/health", get(health_check))
        .nest("/api/v1/pdf", pdf::router(max_upload_bytes))
        .nest("/api/v1/tiktok", tiktok::router())
        .nest("/api/v1/youtube", youtube::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
