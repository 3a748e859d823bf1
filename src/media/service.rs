//! Media resolution service
//!
//! Owns the platform resolvers and dispatches a submitted URL to the one
//! that claims it.

use std::sync::Arc;

use crate::config::MediaConfig;

use super::provider::MediaResolver;
use super::tiktok::TikwmResolver;
use super::types::{MediaError, ResolvedMedia};
use super::youtube::YoutubeResolver;

/// Dispatches link resolution across the configured providers
#[derive(Clone)]
pub struct MediaService {
    tiktok: Arc<TikwmResolver>,
    youtube: Arc<YoutubeResolver>,
}

impl MediaService {
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        Ok(Self {
            tiktok: Arc::new(TikwmResolver::new(config)?),
            youtube: Arc::new(YoutubeResolver::new(config)),
        })
    }

    /// Resolve a link with whichever provider claims it
    pub async fn resolve(&self, url: &str) -> Result<ResolvedMedia, MediaError> {
        for resolver in self.resolvers() {
            if resolver.matches(url) {
                return resolver.resolve(url).await;
            }
        }
        Err(MediaError::UnsupportedUrl(url.to_string()))
    }

    /// The TikTok resolver (also used for slideshow downloads)
    pub fn tiktok(&self) -> &TikwmResolver {
        &self.tiktok
    }

    /// The YouTube resolver
    pub fn youtube(&self) -> &YoutubeResolver {
        &self.youtube
    }

    fn resolvers(&self) -> [&dyn MediaResolver; 2] {
        [self.tiktok.as_ref(), self.youtube.as_ref()]
    }
}
