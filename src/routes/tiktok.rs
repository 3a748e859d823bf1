//! TikTok API endpoints
//!
//! Resolves TikTok links through the tikwm.com public API and packages
//! slideshow images as a zip archive.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::archive;
use crate::error::{AppError, Result};
use crate::media::{MediaResolver, ResolvedMedia};
use crate::state::AppState;

/// Request body for link resolution
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub url: String,
}

/// Create the TikTok router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/resolve", post(resolve))
        .route("/archive", post(archive_slideshow))
}

/// Resolve a TikTok link into downloadable media
async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolvedMedia>> {
    let url = validate_url(&state, &request)?;

    let media = state.media().tiktok().resolve(url).await?;

    tracing::info!(
        "Resolved TikTok link: title={:?} slideshow={}",
        media.title,
        media.is_slideshow()
    );

    Ok(Json(media))
}

/// Download a slideshow's images and return them as a zip archive
async fn archive_slideshow(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Response> {
    let url = validate_url(&state, &request)?;

    let resolver = state.media().tiktok();
    let media = resolver.resolve(url).await?;

    if !media.is_slideshow() {
        return Err(AppError::BadRequest(
            "Link is not an image slideshow".to_string(),
        ));
    }

    let entries = resolver.download_images(&media.images).await?;
    let zip_bytes = archive::build_zip(&entries)?;

    tracing::info!("Archived {} slideshow images", entries.len());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"tiktok_images.zip\"",
        )
        .body(Body::from(zip_bytes))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}

fn validate_url<'a>(state: &AppState, request: &'a ResolveRequest) -> Result<&'a str> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(AppError::BadRequest("url is required".to_string()));
    }
    if !state.media().tiktok().matches(url) {
        return Err(AppError::BadRequest(format!("Not a TikTok link: {}", url)));
    }
    Ok(url)
}
