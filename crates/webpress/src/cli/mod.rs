//! Command implementations and the flags shared between them.

pub mod batch;
pub mod convert_dir;

use clap::Args;
use std::path::Path;
use webpress_core::{BatchItem, Outcome, RawOptions};

/// Encoding flags shared by `convert-dir` and `batch`.
///
/// Absent flags stay `None` so the normalizer falls back to the configured
/// defaults, exactly as it does for the HTTP query parameters.
#[derive(Args, Debug, Clone, Default)]
pub struct EncodeArgs {
    /// WebP quality (1-100)
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Lossless encoding
    #[arg(long)]
    pub lossless: bool,

    /// Target width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Target height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Fit mode when resizing: cover, contain, fill, inside, outside
    #[arg(long)]
    pub fit: Option<String>,

    /// Drop EXIF metadata from outputs
    #[arg(long)]
    pub strip_metadata: bool,
}

impl EncodeArgs {
    pub fn to_raw(&self) -> RawOptions {
        RawOptions {
            quality: self.quality.map(i64::from),
            lossless: self.lossless.then_some(true),
            width: self.width,
            height: self.height,
            fit: self.fit.clone(),
            strip_metadata: self.strip_metadata.then_some(true),
        }
    }
}

/// Print one `OK/SKIP/FAIL` line for a finished item.
///
/// Called from the worker threads; stdout is line-buffered per call so
/// lines from concurrent workers interleave but never tear.
pub(crate) fn report_item(root: &Path, item: &BatchItem) {
    let shown = item.source.strip_prefix(root).unwrap_or(&item.source);
    match &item.outcome {
        Outcome::Converted => println!("OK   {}", shown.display()),
        Outcome::Skipped => println!("SKIP {} (exists, use --force)", shown.display()),
        Outcome::Failed(reason) => println!("FAIL {}: {}", shown.display(), reason),
    }
}

pub(crate) fn summarize(items: &[BatchItem]) -> (usize, usize, usize) {
    let mut converted = 0;
    let mut skipped = 0;
    let mut failed = 0;
    for item in items {
        match item.outcome {
            Outcome::Converted => converted += 1,
            Outcome::Skipped => skipped += 1,
            Outcome::Failed(_) => failed += 1,
        }
    }
    (converted, skipped, failed)
}

/// Final summary line. Per-item failures are reported, not fatal.
pub(crate) fn print_summary(items: &[BatchItem]) {
    let (converted, skipped, failed) = summarize(items);
    println!("Done. Converted: {converted}, Skipped: {skipped}, Failed: {failed}");
}
