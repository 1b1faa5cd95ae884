//! Remote URL byte source with timeout and size guards.
//!
//! The body is streamed and aborted mid-flight as soon as the accumulated
//! byte count exceeds the configured maximum, so an oversized or malicious
//! remote resource never grows memory past the limit. Declared
//! content-length is checked first to avoid fetching at all when possible.

use futures_util::StreamExt;
use std::time::Duration;

use crate::error::ConvertError;

/// Fetches remote source images over http/https.
#[derive(Debug, Clone)]
pub struct UrlFetcher {
    client: reqwest::Client,
    max_bytes: u64,
    timeout_ms: u64,
}

impl UrlFetcher {
    /// Create a fetcher with a byte ceiling and a whole-request timeout.
    ///
    /// Builder failure is a startup fault; a client without the timeout
    /// guard must never be handed out.
    pub fn new(max_bytes: u64, timeout_ms: u64) -> Result<Self, ConvertError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ConvertError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            max_bytes,
            timeout_ms,
        })
    }

    /// Validate a caller-supplied URL: parseable and http/https only.
    pub fn validate_url(url: &str) -> Result<reqwest::Url, ConvertError> {
        let parsed = reqwest::Url::parse(url).map_err(|_| ConvertError::InvalidUrl)?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            _ => Err(ConvertError::InvalidUrlScheme),
        }
    }

    /// Fetch a URL into memory, enforcing the size and timeout guards.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, ConvertError> {
        let url = Self::validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConvertError::Fetch(format!(
                "upstream returned status {status}"
            )));
        }

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes {
                return Err(ConvertError::PayloadTooLarge {
                    max_bytes: self.max_bytes,
                });
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_reqwest(e))?;
            if body.len() as u64 + chunk.len() as u64 > self.max_bytes {
                // Dropping the stream aborts the connection mid-flight.
                return Err(ConvertError::PayloadTooLarge {
                    max_bytes: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    fn map_reqwest(&self, e: reqwest::Error) -> ConvertError {
        if e.is_timeout() {
            ConvertError::FetchTimeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            ConvertError::Fetch(e.to_string())
        }
    }
}

/// Final path segment of a URL, ignoring query string and fragment. Used
/// for the suggested output filename.
pub fn url_file_name(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.to_string())
}
