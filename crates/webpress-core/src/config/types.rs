//! Sub-configuration structs with defaults matching the shipped service.

use serde::{Deserialize, Serialize};

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Allow-set of API keys accepted by the request gate.
    /// Empty means every authenticated request is rejected with
    /// `api_not_configured` — never silently allowed.
    pub api_keys: Vec<String>,

    /// Whether the `url` query parameter may be used as a byte source
    pub allow_url_fetch: bool,

    /// Maximum upload / remote payload size in megabytes
    pub max_upload_mb: u64,

    /// Remote fetch timeout in milliseconds
    pub fetch_timeout_ms: u64,

    /// Rate limiting for admitted requests
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            api_keys: Vec::new(),
            allow_url_fetch: false,
            max_upload_mb: 10,
            fetch_timeout_ms: 15_000,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Upload/fetch ceiling in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }
}

/// Fixed-window rate limit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Max admitted requests per window, per credential
    pub max_requests: u32,

    /// Window duration in milliseconds
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_ms: 60_000,
        }
    }
}

/// Encoding defaults applied by the options normalizer.
///
/// `effort` is process-wide and not overridable per request; it still flows
/// into the cache fingerprint so deployments with different effort settings
/// never share entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Default WebP quality [1,100]
    pub quality: u8,

    /// Default lossless mode
    pub lossless: bool,

    /// WebP encoder effort [0,6]
    pub effort: u8,

    /// Default metadata stripping
    pub strip_metadata: bool,

    /// Process-wide ceiling on concurrent codec runs. Request concurrency
    /// is independent of this: requests past the ceiling queue for a slot
    /// instead of adding pixel work. Not part of the cache fingerprint —
    /// it cannot change output bytes.
    pub codec_concurrency: usize,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            quality: 80,
            lossless: false,
            effort: 4,
            strip_metadata: true,
            codec_concurrency: 2,
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory. Empty disables the cache entirely.
    pub dir: String,

    /// Entry time-to-live in seconds. 0 means entries never go stale.
    pub ttl_secs: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
