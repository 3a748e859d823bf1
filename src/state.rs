//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::media::{MediaError, MediaService};
use crate::pdf::PdfCache;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize media service: {0}")]
    MediaInit(#[from] MediaError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pdf_cache: PdfCache,
    media: MediaService,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self, StateError> {
        let pdf_cache = PdfCache::with_capacity(config.pdf.page_cache_capacity);
        let media = MediaService::new(&config.media)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pdf_cache,
                media,
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the PDF cache
    pub fn pdf_cache(&self) -> &PdfCache {
        &self.inner.pdf_cache
    }

    /// Get the media resolution service
    pub fn media(&self) -> &MediaService {
        &self.inner.media
    }
}
