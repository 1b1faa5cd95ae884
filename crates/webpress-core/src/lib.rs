//! Webpress Core - JPEG/PNG to WebP conversion pipeline.
//!
//! The library behind both the HTTP conversion service and the batch CLI
//! tools. The pipeline is:
//!
//! ```text
//! bytes + raw options → Normalize → Fingerprint → Cache lookup
//!                                      ↓ miss
//!                        Sniff → Decode → Orient → Resize → Encode
//!                                      ↓
//!                               Cache store (best-effort) → bytes
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use webpress_core::{Config, Converter, RawOptions};
//!
//! #[tokio::main]
//! async fn main() -> webpress_core::Result<()> {
//!     let config = Config::load().expect("config");
//!     let converter = Converter::new(config.encoding.clone(), &config.cache);
//!
//!     let webp = converter.convert(jpeg_bytes, &RawOptions::default()).await?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod batch;
pub mod cache;
pub mod codec;
pub mod config;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod fingerprint;
pub mod gate;
pub mod options;

// Re-exports for convenient access
pub use batch::{run_batch, BatchItem, Outcome};
pub use cache::ResultCache;
pub use config::Config;
pub use convert::{Converted, Converter};
pub use error::{ConfigError, ConvertError, GateError, Result};
pub use fetch::UrlFetcher;
pub use fingerprint::{fingerprint, Fingerprint};
pub use gate::ApiGate;
pub use options::{ConversionOptions, FitMode, RawOptions};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
