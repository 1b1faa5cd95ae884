//! Conversion orchestration: normalizer, fingerprint, cache, and codec.
//!
//! Codec work is CPU-bound and runs on the blocking pool behind a
//! process-wide slot ceiling (`encoding.codec_concurrency`): request
//! concurrency stays unbounded, pixel parallelism does not. Requests past
//! the ceiling queue for a slot.

use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::cache::ResultCache;
use crate::codec;
use crate::config::{CacheConfig, EncodingConfig};
use crate::error::{ConvertError, Result};
use crate::fingerprint::fingerprint;
use crate::options::{ConversionOptions, RawOptions};

/// Ceiling on concurrent codec runs, shared by every clone of a
/// [`Converter`]. A slot is held only for the duration of the blocking
/// codec call, never across cache I/O.
#[derive(Debug, Clone)]
struct CodecSlots {
    semaphore: Arc<Semaphore>,
}

impl CodecSlots {
    fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    /// Run a codec closure on the blocking pool under one slot.
    async fn run<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| ConvertError::Internal(format!("codec slots unavailable: {e}")))?;
        tokio::task::spawn_blocking(move || {
            let _slot = permit;
            work()
        })
        .await
        .map_err(|e| ConvertError::Internal(format!("codec task failed: {e}")))?
    }
}

/// Result of a conversion request.
#[derive(Debug)]
pub struct Converted {
    /// Encoded WebP output
    pub bytes: Vec<u8>,
    /// Whether the bytes came from the result cache
    pub cache_hit: bool,
}

/// Ties the normalizer, cache, and codec into a single `convert` operation.
///
/// Cheap to clone and share across request handlers.
#[derive(Debug, Clone)]
pub struct Converter {
    defaults: EncodingConfig,
    cache: ResultCache,
    slots: CodecSlots,
}

impl Converter {
    pub fn new(defaults: EncodingConfig, cache_config: &CacheConfig) -> Self {
        let cache = ResultCache::new(cache_config);
        Self::with_cache(defaults, cache)
    }

    /// Build with an explicit cache, used by tests and the batch tools.
    pub fn with_cache(defaults: EncodingConfig, cache: ResultCache) -> Self {
        let slots = CodecSlots::new(defaults.codec_concurrency);
        Self {
            defaults,
            cache,
            slots,
        }
    }

    /// Normalize raw options against this converter's defaults.
    pub fn normalize(&self, raw: &RawOptions) -> ConversionOptions {
        ConversionOptions::normalize(raw, &self.defaults)
    }

    /// Convert JPEG/PNG bytes to WebP, consulting the cache when enabled.
    ///
    /// On a cache hit no codec work is performed. On a miss the codec runs
    /// on the blocking pool and the result is stored best-effort; a failed
    /// store never fails the conversion. Concurrent misses for the same
    /// fingerprint each encode independently — the deterministic codec and
    /// the cache's atomic rename make that safe.
    pub async fn convert(&self, bytes: Vec<u8>, raw: &RawOptions) -> Result<Converted> {
        let options = self.normalize(raw);

        if !self.cache.enabled() {
            let output = self.transcode_blocking(bytes, options).await?;
            return Ok(Converted {
                bytes: output,
                cache_hit: false,
            });
        }

        let fp = fingerprint(&bytes, &options);
        if let Some(cached) = self.cache.lookup(&fp).await {
            tracing::debug!(fingerprint = %fp, "cache hit");
            return Ok(Converted {
                bytes: cached,
                cache_hit: true,
            });
        }

        let output = self.transcode_blocking(bytes, options).await?;
        self.cache.store(&fp, &output).await;
        Ok(Converted {
            bytes: output,
            cache_hit: false,
        })
    }

    /// Run the CPU-bound codec off the async worker threads, capped by the
    /// codec slot ceiling.
    async fn transcode_blocking(
        &self,
        bytes: Vec<u8>,
        options: ConversionOptions,
    ) -> Result<Vec<u8>> {
        self.slots
            .run(move || codec::transcode(&bytes, &options))
            .await
    }
}
