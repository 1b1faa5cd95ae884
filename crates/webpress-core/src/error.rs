//! Error types for the webpress conversion pipeline.
//!
//! Every caller-facing variant carries a stable machine-readable reason code
//! via [`ConvertError::code`] / [`GateError::code`]. The HTTP layer matches
//! these once at the response boundary; nothing else inspects error strings.

use thiserror::Error;

/// Errors produced by the conversion pipeline and its byte sources.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Input bytes did not sniff as JPEG or PNG.
    #[error("Unsupported image format. Only JPEG and PNG are allowed.")]
    UnsupportedFormat,

    /// Bytes sniffed as a supported format but failed to decode.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// WebP encoding failed.
    #[error("Failed to encode WebP: {0}")]
    Encode(String),

    /// Neither a file upload nor a url parameter was supplied.
    #[error("Provide a multipart file (field \"file\") or url query parameter")]
    MissingInput,

    /// The url parameter could not be parsed.
    #[error("Invalid URL")]
    InvalidUrl,

    /// The url parameter used a scheme other than http/https.
    #[error("Only http/https URLs are allowed")]
    InvalidUrlScheme,

    /// Remote fetching is disabled by configuration.
    #[error("URL fetching is disabled on this server")]
    UrlFetchDisabled,

    /// Declared or accumulated byte count exceeded the configured maximum.
    #[error("Payload too large (limit {max_bytes} bytes)")]
    PayloadTooLarge { max_bytes: u64 },

    /// Remote fetch failed (connect error or non-success status).
    #[error("Failed to fetch URL: {0}")]
    Fetch(String),

    /// Remote fetch exceeded the configured timeout.
    #[error("Timed out fetching URL after {timeout_ms}ms")]
    FetchTimeout { timeout_ms: u64 },

    /// Local file I/O failed (batch source read, destination write).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal failure (blocking task join, codec invariants).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Stable reason code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported_format",
            Self::Decode(_) => "decode_failed",
            Self::Encode(_) => "encode_failed",
            Self::MissingInput => "missing_input",
            Self::InvalidUrl => "invalid_url",
            Self::InvalidUrlScheme => "invalid_url_scheme",
            Self::UrlFetchDisabled => "url_fetch_disabled",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Fetch(_) => "fetch_error",
            Self::FetchTimeout { .. } => "fetch_timeout",
            Self::Io(_) => "io_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// True for errors caused by the request itself rather than the server.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, Self::Encode(_) | Self::Io(_) | Self::Internal(_))
    }
}

/// Rejections produced by the request gate before any conversion work.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GateError {
    /// No credential supplied in either accepted location.
    #[error("Provide X-API-Key header or Authorization: Bearer")]
    MissingApiKey,

    /// The server has an empty allow-set.
    #[error("Server has no API keys configured")]
    NoKeysConfigured,

    /// Credential supplied but not in the allow-set.
    #[error("API key not authorized")]
    InvalidApiKey,

    /// Caller exceeded the admission window.
    #[error("Rate limit exceeded; retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

impl GateError {
    /// Stable reason code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::NoKeysConfigured => "api_not_configured",
            Self::InvalidApiKey => "invalid_api_key",
            Self::RateLimited { .. } => "rate_limited",
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Convenience type alias for conversion results.
pub type Result<T> = std::result::Result<T, ConvertError>;
