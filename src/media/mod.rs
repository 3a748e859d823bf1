//! Media link resolution
//!
//! TikTok resolution goes through the tikwm.com public API; YouTube links
//! are parsed offline and delegated to third-party download endpoints.

pub mod provider;
pub mod service;
pub mod tiktok;
pub mod types;
pub mod youtube;

pub use provider::MediaResolver;
pub use service::MediaService;
pub use tiktok::TikwmResolver;
pub use types::{MediaError, MediaFormat, MediaKind, MediaProvider, ResolvedMedia};
pub use youtube::YoutubeResolver;
