//! Bounded worker pool and file conversion for the batch tools.
//!
//! Workers claim items from a shared atomic index, so exactly `concurrency`
//! claims can be in flight and no item is processed twice. One item's
//! failure never aborts the batch: every outcome, including failures, lands
//! in the returned list.

use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::codec;
use crate::error::ConvertError;
use crate::options::ConversionOptions;

/// Per-file result of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Destination written
    Converted,
    /// Destination already existed and overwrite was not requested
    Skipped,
    /// This item failed; the rest of the batch is unaffected
    Failed(String),
}

/// One discovered input file and what happened to it.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub outcome: Outcome,
}

/// Recursively discover JPEG/PNG files under a root, sorted by path.
///
/// Extension-based pre-filtering only — the codec still sniffs actual bytes
/// before converting, so a misnamed file fails that item, not the batch.
pub fn discover_images(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && has_image_extension(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ext == "jpg" || ext == "jpeg" || ext == "png"
        })
        .unwrap_or(false)
}

/// Uniformly sample `limit` files without replacement. Returns the input
/// unchanged when it already fits the limit.
pub fn sample_files(mut files: Vec<PathBuf>, limit: usize) -> Vec<PathBuf> {
    if files.len() <= limit {
        return files;
    }
    let mut rng = rand::thread_rng();
    files.shuffle(&mut rng);
    files.truncate(limit);
    files
}

/// Drive `convert_one` over `sources` with a fixed number of workers.
///
/// Spawns `min(concurrency, sources.len())` workers; each repeatedly claims
/// the next unclaimed index until none remain. The returned outcomes are in
/// completion order, not input order.
pub async fn run_batch<F>(
    sources: Vec<PathBuf>,
    concurrency: usize,
    convert_one: F,
) -> Vec<BatchItem>
where
    F: Fn(PathBuf) -> BatchItem + Send + Sync + 'static,
{
    let concurrency = concurrency.max(1).min(sources.len().max(1));
    let sources = Arc::new(sources);
    let next = Arc::new(AtomicUsize::new(0));
    let convert_one = Arc::new(convert_one);

    let mut workers = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        let sources = Arc::clone(&sources);
        let next = Arc::clone(&next);
        let convert_one = Arc::clone(&convert_one);

        workers.push(tokio::task::spawn_blocking(move || {
            let mut done = Vec::new();
            loop {
                let i = next.fetch_add(1, Ordering::SeqCst);
                let Some(source) = sources.get(i) else {
                    return done;
                };
                done.push(convert_one(source.clone()));
            }
        }));
    }

    let mut items = Vec::with_capacity(sources.len());
    for worker in workers {
        match worker.await {
            Ok(done) => items.extend(done),
            Err(e) => tracing::error!(error = %e, "batch worker task failed"),
        }
    }
    items
}

/// Convert a single file to its destination path.
///
/// Skips when the destination exists and `force` is false, leaving the
/// existing bytes untouched. Any error is folded into the item's outcome.
pub fn convert_file(
    source: &Path,
    dest: &Path,
    options: &ConversionOptions,
    force: bool,
) -> BatchItem {
    let outcome = convert_file_inner(source, dest, options, force)
        .unwrap_or_else(|e| Outcome::Failed(e.to_string()));
    BatchItem {
        source: source.to_path_buf(),
        dest: dest.to_path_buf(),
        outcome,
    }
}

fn convert_file_inner(
    source: &Path,
    dest: &Path,
    options: &ConversionOptions,
    force: bool,
) -> Result<Outcome, ConvertError> {
    if !force && dest.exists() {
        return Ok(Outcome::Skipped);
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = std::fs::read(source)?;
    let output = codec::transcode(&bytes, options)?;
    std::fs::write(dest, output)?;
    Ok(Outcome::Converted)
}

/// Destination for in-place conversion: same directory, `.webp` extension.
pub fn in_place_dest(source: &Path) -> PathBuf {
    source.with_extension("webp")
}

/// Destination under a mirrored output tree.
pub fn mirrored_dest(source: &Path, src_root: &Path, out_root: &Path) -> PathBuf {
    let relative = source.strip_prefix(src_root).unwrap_or(source);
    out_root.join(relative).with_extension("webp")
}
