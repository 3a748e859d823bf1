//! Configuration management for the toolbox server

use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub pdf: PdfConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
    /// Capacity of the rendered-page LRU cache
    pub page_cache_capacity: usize,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Base URL of the TikTok resolver API
    pub tikwm_base_url: String,
    /// Base URL of the YouTube download delegate
    pub delegate_base_url: String,
    /// Timeout for outbound media requests
    pub request_timeout_secs: u64,
    /// User-Agent sent on outbound media requests
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            pdf: PdfConfig {
                page_cache_capacity: 100,
                max_upload_bytes: 256 * 1024 * 1024,
            },
            media: MediaConfig {
                tikwm_base_url: "https://www.tikwm.com".to_string(),
                delegate_base_url: "https://api.vve.pw".to_string(),
                request_timeout_secs: 20,
                user_agent: default_user_agent(),
            },
        }
    }
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            pdf: PdfConfig {
                page_cache_capacity: env::var("PDF_PAGE_CACHE_CAPACITY")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.pdf.page_cache_capacity),
                max_upload_bytes: env::var("PDF_MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.pdf.max_upload_bytes),
            },
            media: MediaConfig {
                tikwm_base_url: env::var("TIKWM_BASE_URL")
                    .unwrap_or(defaults.media.tikwm_base_url),
                delegate_base_url: env::var("DELEGATE_BASE_URL")
                    .unwrap_or(defaults.media.delegate_base_url),
                request_timeout_secs: env::var("MEDIA_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.media.request_timeout_secs),
                user_agent: env::var("MEDIA_USER_AGENT")
                    .unwrap_or(defaults.media.user_agent),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.pdf.page_cache_capacity, 100);
        assert_eq!(config.media.tikwm_base_url, "https://www.tikwm.com");
        assert_eq!(config.media.delegate_base_url, "https://api.vve.pw");
    }

    #[test]
    fn test_user_agent_carries_version() {
        let config = Config::default();
        assert!(config.media.user_agent.starts_with("toolbox-server/"));
    }
}
