//! TikTok link resolution via the tikwm.com public API
//!
//! The API does the actual extraction; this client submits the link, maps
//! the response, and (for slideshow posts) downloads the images for zip
//! packaging.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::archive::{self, ArchiveEntry};
use crate::config::MediaConfig;

use super::provider::MediaResolver;
use super::types::{MediaError, MediaProvider, ResolvedMedia};

/// tikwm API envelope: `code == 0` means success
#[derive(Debug, Deserialize)]
struct TikwmResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<TikwmData>,
}

#[derive(Debug, Deserialize)]
struct TikwmData {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    cover: Option<String>,
    /// Watermark-free play URL (video posts)
    #[serde(default)]
    play: Option<String>,
    /// Slideshow image URLs (image posts)
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    author: Option<TikwmAuthor>,
}

#[derive(Debug, Deserialize)]
struct TikwmAuthor {
    #[serde(default)]
    nickname: Option<String>,
}

/// TikTok resolver backed by tikwm.com
pub struct TikwmResolver {
    client: reqwest::Client,
    base_url: String,
}

impl TikwmResolver {
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MediaError::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.tikwm_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the tikwm request URL for a submitted link
    fn api_url(&self, url: &str) -> String {
        format!("{}/api/?url={}", self.base_url, urlencoding::encode(url))
    }

    /// Download every slideshow image concurrently and name the entries
    /// `image_1.jpg`, `image_2.jpg`, ...
    ///
    /// Any single failed download fails the whole batch; a partial archive
    /// would silently drop images.
    pub async fn download_images(
        &self,
        urls: &[String],
    ) -> Result<Vec<ArchiveEntry>, MediaError> {
        let fetches = urls.iter().enumerate().map(|(i, url)| {
            let client = self.client.clone();
            let url = url.clone();
            async move {
                let response = client.get(&url).send().await.map_err(|e| {
                    MediaError::Download(format!("image {}: {}", i + 1, e))
                })?;

                if !response.status().is_success() {
                    return Err(MediaError::Download(format!(
                        "image {}: HTTP {}",
                        i + 1,
                        response.status()
                    )));
                }

                let bytes = response.bytes().await.map_err(|e| {
                    MediaError::Download(format!("image {}: {}", i + 1, e))
                })?;

                Ok(ArchiveEntry::new(
                    archive::image_entry_name(i + 1),
                    bytes.to_vec(),
                ))
            }
        });

        futures::future::try_join_all(fetches).await
    }
}

#[async_trait]
impl MediaResolver for TikwmResolver {
    fn provider(&self) -> MediaProvider {
        MediaProvider::Tiktok
    }

    fn matches(&self, url: &str) -> bool {
        url.contains("tiktok.com")
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedMedia, MediaError> {
        let endpoint = self.api_url(url);
        tracing::debug!("Resolving TikTok link via {}", self.base_url);

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| MediaError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaError::Upstream(format!(
                "tikwm returned HTTP {}",
                response.status()
            )));
        }

        let body: TikwmResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Decode(e.to_string()))?;

        if body.code != 0 {
            return Err(MediaError::InvalidLink(
                body.msg
                    .unwrap_or_else(|| "no media data for this link".to_string()),
            ));
        }

        let data = body
            .data
            .ok_or_else(|| MediaError::Decode("success response without data".to_string()))?;

        Ok(ResolvedMedia {
            provider: MediaProvider::Tiktok,
            id: data.id,
            title: data.title,
            author: data.author.and_then(|a| a.nickname),
            cover: data.cover,
            play_url: data.play,
            images: data.images.unwrap_or_default(),
            formats: Vec::new(),
            resolved_at: Utc::now(),
        })
    }
}
