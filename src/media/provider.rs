//! Media resolver trait
//!
//! Each supported platform implements `MediaResolver`; the service picks a
//! resolver by URL.

use async_trait::async_trait;

use super::types::{MediaError, MediaProvider, ResolvedMedia};

/// Link resolver for one media platform
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Get the provider type
    fn provider(&self) -> MediaProvider;

    /// Whether this resolver handles the given URL
    fn matches(&self, url: &str) -> bool;

    /// Resolve a link into downloadable media
    async fn resolve(&self, url: &str) -> Result<ResolvedMedia, MediaError>;
}
