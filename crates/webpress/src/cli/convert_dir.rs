//! The `webpress convert-dir` command: in-place directory conversion.
//!
//! Every `foo.jpg` / `foo.png` under the directory gains a `foo.webp`
//! sibling. Sources are never touched.

use clap::Args;
use std::path::PathBuf;
use webpress_core::batch::{convert_file, discover_images, in_place_dest, run_batch};
use webpress_core::{Config, ConversionOptions};

use super::{print_summary, report_item, EncodeArgs};

/// Arguments for the `convert-dir` command.
#[derive(Args, Debug)]
pub struct ConvertDirArgs {
    /// Directory to convert in place
    #[arg(required = true)]
    pub dir: PathBuf,

    #[command(flatten)]
    pub encode: EncodeArgs,

    /// Number of parallel workers
    #[arg(short, long, default_value = "4")]
    pub concurrency: usize,

    /// Overwrite existing .webp outputs
    #[arg(short, long)]
    pub force: bool,
}

pub async fn execute(args: ConvertDirArgs, config: Config) -> anyhow::Result<()> {
    // Pre-flight before any conversion starts
    if !args.dir.is_dir() {
        anyhow::bail!("source is not a directory: {}", args.dir.display());
    }

    let options = ConversionOptions::normalize(&args.encode.to_raw(), &config.encoding);
    let sources = discover_images(&args.dir);
    println!(
        "Found {} image(s) under {}",
        sources.len(),
        args.dir.display()
    );

    let root = args.dir.clone();
    let force = args.force;
    let items = run_batch(sources, args.concurrency.max(1), move |source| {
        let dest = in_place_dest(&source);
        let item = convert_file(&source, &dest, &options, force);
        report_item(&root, &item);
        item
    })
    .await;

    print_summary(&items);
    Ok(())
}
