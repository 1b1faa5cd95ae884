//! The `webpress batch` command: convert into a mirrored output tree.
//!
//! Unlike `convert-dir`, sources and outputs live in separate trees, and a
//! `--limit` flag converts a uniform random sample instead of everything.

use clap::Args;
use std::path::{Path, PathBuf};
use webpress_core::batch::{convert_file, discover_images, mirrored_dest, run_batch, sample_files};
use webpress_core::{Config, ConversionOptions};

use super::{print_summary, report_item, EncodeArgs};

/// Arguments for the `batch` command.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Source directory to convert
    #[arg(required = true)]
    pub dir: PathBuf,

    /// Output directory (defaults to a `<dir>-output` sibling)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Convert at most this many files, sampled uniformly
    #[arg(short, long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub encode: EncodeArgs,

    /// Number of parallel workers
    #[arg(short, long, default_value = "4")]
    pub concurrency: usize,

    /// Overwrite existing outputs
    #[arg(short, long)]
    pub force: bool,
}

/// Default output tree: a sibling directory named after the source.
fn default_output_dir(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("images");
    dir.with_file_name(format!("{name}-output"))
}

pub async fn execute(args: BatchArgs, config: Config) -> anyhow::Result<()> {
    // Pre-flight before any conversion starts
    if !args.dir.is_dir() {
        anyhow::bail!("source is not a directory: {}", args.dir.display());
    }

    let out_root = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.dir));
    println!("Source: {}", args.dir.display());
    println!("Output: {}", out_root.display());

    let options = ConversionOptions::normalize(&args.encode.to_raw(), &config.encoding);
    let discovered = discover_images(&args.dir);
    println!("Found {} image(s)", discovered.len());

    let sources = match args.limit {
        Some(limit) if discovered.len() > limit => {
            let sampled = sample_files(discovered, limit);
            println!("Sampled {} of them", sampled.len());
            sampled
        }
        _ => discovered,
    };

    let src_root = args.dir.clone();
    let force = args.force;
    let items = run_batch(sources, args.concurrency.max(1), move |source| {
        let dest = mirrored_dest(&source, &src_root, &out_root);
        let item = convert_file(&source, &dest, &options, force);
        report_item(&src_root, &item);
        item
    })
    .await;

    print_summary(&items);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_is_a_sibling() {
        assert_eq!(
            default_output_dir(Path::new("/data/photos")),
            PathBuf::from("/data/photos-output")
        );
        assert_eq!(
            default_output_dir(Path::new("photos")),
            PathBuf::from("photos-output")
        );
    }
}
