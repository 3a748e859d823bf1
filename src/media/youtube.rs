//! YouTube link parsing
//!
//! Fully offline: extracts the video id from a link and hands back delegate
//! download endpoints plus the canonical thumbnail URL. No request is made
//! to YouTube or the delegate.

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;

use crate::config::MediaConfig;

use super::provider::MediaResolver;
use super::types::{MediaError, MediaFormat, MediaKind, MediaProvider, ResolvedMedia};

/// YouTube resolver delegating downloads to a third-party endpoint
pub struct YoutubeResolver {
    delegate_base_url: String,
    id_pattern: Regex,
}

impl YoutubeResolver {
    pub fn new(config: &MediaConfig) -> Self {
        // Accepts youtube.com/watch?v=ID, youtu.be/ID and bare-path forms
        let id_pattern = Regex::new(
            r"(?:https?://)?(?:www\.)?(?:youtube\.com|youtu\.be)/(?:watch\?v=)?([^?&/]+)",
        )
        .expect("youtube id pattern is valid");

        Self {
            delegate_base_url: config.delegate_base_url.trim_end_matches('/').to_string(),
            id_pattern,
        }
    }

    /// Extract the video id from a YouTube URL
    pub fn extract_video_id(&self, url: &str) -> Option<String> {
        self.id_pattern
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|id| !id.is_empty())
    }

    fn delegate_url(&self, kind: &str, id: &str) -> String {
        format!("{}/api/button/{}/{}", self.delegate_base_url, kind, id)
    }
}

#[async_trait]
impl MediaResolver for YoutubeResolver {
    fn provider(&self) -> MediaProvider {
        MediaProvider::Youtube
    }

    fn matches(&self, url: &str) -> bool {
        url.contains("youtube.com") || url.contains("youtu.be")
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedMedia, MediaError> {
        let id = self
            .extract_video_id(url)
            .ok_or_else(|| MediaError::InvalidLink(url.to_string()))?;

        Ok(ResolvedMedia {
            provider: MediaProvider::Youtube,
            cover: Some(format!(
                "https://img.youtube.com/vi/{}/maxresdefault.jpg",
                id
            )),
            title: Some("YouTube Content".to_string()),
            author: None,
            play_url: None,
            images: Vec::new(),
            formats: vec![
                MediaFormat {
                    label: "Video MP4 (HD)".to_string(),
                    url: self.delegate_url("mp4", &id),
                    kind: MediaKind::Video,
                },
                MediaFormat {
                    label: "Audio MP3".to_string(),
                    url: self.delegate_url("mp3", &id),
                    kind: MediaKind::Audio,
                },
            ],
            id: Some(id),
            resolved_at: Utc::now(),
        })
    }
}
