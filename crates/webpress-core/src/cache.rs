//! Content-addressed result cache with TTL freshness and atomic writes.
//!
//! Entries live as `<fingerprint>.webp` files in a single flat directory.
//! Writes go to a dot-prefixed temporary name in the same directory and are
//! renamed into place, so a concurrent lookup observes either the complete
//! prior entry (or a miss) or the complete new entry — never partial bytes.
//!
//! Storage errors are logged and swallowed: the conversion already
//! succeeded, and caching is a best-effort optimization. Stale entries are
//! treated as misses but left on disk; the next successful store overwrites
//! them.

use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::config::CacheConfig;
use crate::fingerprint::Fingerprint;

/// Disk-backed cache of conversion outputs keyed by fingerprint.
///
/// Constructed with no directory, every `lookup` is a miss and `store` is a
/// no-op without touching the filesystem.
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: Option<PathBuf>,
    ttl: Duration,
}

impl ResultCache {
    /// Build from configuration; an empty directory string disables caching.
    pub fn new(config: &CacheConfig) -> Self {
        let dir = if config.dir.is_empty() {
            None
        } else {
            let expanded = shellexpand::tilde(&config.dir);
            Some(PathBuf::from(expanded.into_owned()))
        };
        Self {
            dir,
            ttl: Duration::from_secs(config.ttl_secs),
        }
    }

    /// Build a cache rooted at an explicit directory with an explicit TTL.
    ///
    /// A zero TTL means entries never go stale.
    pub fn with_dir(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: Some(dir.into()),
            ttl,
        }
    }

    /// A cache that never hits and never stores.
    pub fn disabled() -> Self {
        Self {
            dir: None,
            ttl: Duration::ZERO,
        }
    }

    /// Whether a cache directory is configured.
    pub fn enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// On-disk path for a fingerprint, if the cache is enabled.
    pub fn entry_path(&self, fp: &Fingerprint) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{fp}.webp")))
    }

    /// Look up a fresh entry. Returns `None` on absence, staleness, or any
    /// read error — staleness is absence, not an error.
    pub async fn lookup(&self, fp: &Fingerprint) -> Option<Vec<u8>> {
        let path = self.entry_path(fp)?;

        let meta = tokio::fs::metadata(&path).await.ok()?;
        if self.ttl > Duration::ZERO {
            let age = meta
                .modified()
                .ok()
                .and_then(|mtime| SystemTime::now().duration_since(mtime).ok())?;
            if age > self.ttl {
                tracing::debug!(fingerprint = %fp, age_secs = age.as_secs(), "cache entry stale");
                return None;
            }
        }

        tokio::fs::read(&path).await.ok()
    }

    /// Store conversion output under a fingerprint, best-effort.
    ///
    /// Never fails the caller: any I/O error is logged at warn and dropped.
    pub async fn store(&self, fp: &Fingerprint, bytes: &[u8]) {
        let Some(path) = self.entry_path(fp) else {
            return;
        };
        if let Err(e) = self.store_atomic(&path, bytes).await {
            tracing::warn!(fingerprint = %fp, error = %e, "cache store failed");
        }
    }

    async fn store_atomic(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| std::io::Error::other("cache path has no parent"))?;
        tokio::fs::create_dir_all(dir).await?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| std::io::Error::other("cache path has no file name"))?;
        let suffix: u64 = rand::thread_rng().gen();
        let tmp = dir.join(format!(".{file_name}.{suffix:016x}.tmp"));

        tokio::fs::write(&tmp, bytes).await?;
        match tokio::fs::rename(&tmp, path).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Don't leave the temp file behind on a failed rename.
                let _ = tokio::fs::remove_file(&tmp).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingConfig;
    use crate::fingerprint::fingerprint;
    use crate::options::{ConversionOptions, RawOptions};

    fn fp_for(bytes: &[u8]) -> Fingerprint {
        let opts = ConversionOptions::normalize(&RawOptions::default(), &EncodingConfig::default());
        fingerprint(bytes, &opts)
    }

    #[tokio::test]
    async fn test_store_then_lookup_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::with_dir(dir.path(), Duration::ZERO);
        let fp = fp_for(b"input");

        assert!(cache.lookup(&fp).await.is_none());
        cache.store(&fp, b"webp output").await;
        assert_eq!(cache.lookup(&fp).await.as_deref(), Some(&b"webp output"[..]));
    }

    #[tokio::test]
    async fn test_zero_ttl_never_stale() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::with_dir(dir.path(), Duration::ZERO);
        let fp = fp_for(b"input");

        cache.store(&fp, b"bytes").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.lookup(&fp).await.is_some());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_but_stays_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::with_dir(dir.path(), Duration::from_millis(30));
        let fp = fp_for(b"input");

        cache.store(&fp, b"bytes").await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(cache.lookup(&fp).await.is_none());
        // Stale entries are not deleted
        assert!(cache.entry_path(&fp).unwrap().exists());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_stale_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::with_dir(dir.path(), Duration::ZERO);
        let fp = fp_for(b"input");

        cache.store(&fp, b"first").await;
        cache.store(&fp, b"second").await;
        assert_eq!(cache.lookup(&fp).await.as_deref(), Some(&b"second"[..]));
    }

    #[tokio::test]
    async fn test_disabled_cache_is_noop() {
        let cache = ResultCache::disabled();
        let fp = fp_for(b"input");

        assert!(!cache.enabled());
        assert!(cache.entry_path(&fp).is_none());
        cache.store(&fp, b"bytes").await;
        assert!(cache.lookup(&fp).await.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        // Point the cache at a path whose parent is a regular file: every
        // write must fail, and store must still return normally.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"occupied").unwrap();

        let cache = ResultCache::with_dir(&blocker, Duration::ZERO);
        let fp = fp_for(b"input");
        cache.store(&fp, b"bytes").await;
        assert!(cache.lookup(&fp).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_lookup_never_observes_partial_store() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::with_dir(dir.path(), Duration::ZERO);
        let fp = fp_for(b"input");

        let len = 64 * 1024;
        let first = vec![0xAAu8; len];
        let second = vec![0xBBu8; len];
        cache.store(&fp, &first).await;

        let writer = tokio::spawn({
            let cache = cache.clone();
            async move {
                for _ in 0..25 {
                    cache.store(&fp, &second).await;
                }
            }
        });
        let reader = tokio::spawn({
            let cache = cache.clone();
            async move {
                for _ in 0..200 {
                    let bytes = cache.lookup(&fp).await.expect("entry present throughout");
                    // Every observation is one complete entry, never a mix
                    assert_eq!(bytes.len(), len);
                    let marker = bytes[0];
                    assert!(marker == 0xAA || marker == 0xBB);
                    assert!(bytes.iter().all(|b| *b == marker));
                }
            }
        });

        writer.await.unwrap();
        reader.await.unwrap();
    }

    #[tokio::test]
    async fn test_no_temp_files_left_after_store() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::with_dir(dir.path(), Duration::ZERO);
        let fp = fp_for(b"input");

        cache.store(&fp, b"bytes").await;

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_empty_config_dir_disables() {
        let cache = ResultCache::new(&CacheConfig::default());
        assert!(!cache.enabled());
    }
}
