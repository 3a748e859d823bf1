//! Media resolution types
//!
//! Types shared by the TikTok and YouTube link resolvers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Media provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaProvider {
    Tiktok,
    Youtube,
}

/// Kind of downloadable format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

/// A downloadable format offered by a delegate endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFormat {
    /// Human-readable label, e.g. "Video MP4 (HD)"
    pub label: String,
    /// Delegate download URL
    pub url: String,
    pub kind: MediaKind,
}

/// Resolved media for a submitted link
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMedia {
    pub provider: MediaProvider,
    /// Provider-side content id, when one can be derived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Cover/thumbnail URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    /// Direct watermark-free play URL (video posts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_url: Option<String>,
    /// Slideshow image URLs (image posts)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Delegate download formats (YouTube)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<MediaFormat>,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedMedia {
    /// Whether this post is an image slideshow rather than a video
    pub fn is_slideshow(&self) -> bool {
        !self.images.is_empty()
    }
}

/// Media resolution errors
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("No resolver for URL: {0}")]
    UnsupportedUrl(String),

    #[error("Link not recognized: {0}")]
    InvalidLink(String),

    #[error("Upstream API failure: {0}")]
    Upstream(String),

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    #[error("Failed to download media: {0}")]
    Download(String),
}

impl MediaError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::UnsupportedUrl(_) | Self::InvalidLink(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::Decode(_) | Self::Download(_) => StatusCode::BAD_GATEWAY,
        }
    }
}
