//! YouTube API endpoints
//!
//! Parses YouTube links offline and returns delegate download endpoints.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::media::{MediaResolver, ResolvedMedia};
use crate::state::AppState;

/// Request body for link resolution
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub url: String,
}

/// Create the YouTube router
pub fn router() -> Router<AppState> {
    Router::new().route("/resolve", post(resolve))
}

/// Parse a YouTube link and return delegate download formats
async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolvedMedia>> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(AppError::BadRequest("url is required".to_string()));
    }

    let resolver = state.media().youtube();
    if !resolver.matches(url) {
        return Err(AppError::BadRequest(format!("Not a YouTube link: {}", url)));
    }

    let media = resolver.resolve(url).await?;

    tracing::info!("Resolved YouTube link: id={:?}", media.id);

    Ok(Json(media))
}
